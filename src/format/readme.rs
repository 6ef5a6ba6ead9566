//! README formatting: absolute URLs for links that lack a scheme.

use crate::error::Result;
use crate::ui::{Prompt, PromptOption, PromptType, UserInterface};
use regex::Regex;
use std::sync::LazyLock;

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^)\s]*)\)").expect("valid regex"));

static HTML_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<[^>]*?href\s*=\s*"([^"]*)""#).expect("valid regex"));

const ADD_SCHEME: &str = "add";
const NEW_ADDRESS: &str = "new";
const SKIP: &str = "skip";

/// Where a link was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    Markdown,
    Html,
}

/// A link whose URL has no scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeLink {
    pub kind: LinkKind,
    /// The full matched text, e.g. `[docs](example.com)`.
    pub matched: String,
    pub url: String,
}

impl RelativeLink {
    fn with_url(&self, url: &str) -> String {
        match self.kind {
            LinkKind::Markdown => {
                let label_end = self.matched.rfind("](").unwrap_or(self.matched.len());
                format!("{}]({})", &self.matched[..label_end], url)
            }
            LinkKind::Html => self
                .matched
                .replacen(&format!("\"{}\"", self.url), &format!("\"{}\"", url), 1),
        }
    }
}

fn is_absolute(url: &str) -> bool {
    url.is_empty()
        || url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with('#')
        || url.starts_with("mailto:")
}

/// Markdown links (not images) and HTML hrefs whose URL lacks a scheme.
pub fn find_relative_links(text: &str) -> Vec<RelativeLink> {
    let markdown = MARKDOWN_LINK
        .captures_iter(text)
        .filter(|c| c[1].is_empty() && !is_absolute(&c[3]))
        .map(|c| RelativeLink {
            kind: LinkKind::Markdown,
            matched: c[0].to_string(),
            url: c[3].to_string(),
        });
    let html = HTML_HREF
        .captures_iter(text)
        .filter(|c| !is_absolute(&c[1]))
        .map(|c| RelativeLink {
            kind: LinkKind::Html,
            matched: c[0].to_string(),
            url: c[1].to_string(),
        });
    markdown.chain(html).collect()
}

fn ask(link: &RelativeLink, ui: &mut dyn UserInterface) -> Result<Option<String>> {
    let choice = ui.prompt(&Prompt {
        key: "readme_link".to_string(),
        question: format!("Found a link without a scheme: {}", link.url),
        prompt_type: PromptType::Select {
            options: vec![
                PromptOption::new(format!("Use https://{}", link.url), ADD_SCHEME),
                PromptOption::new("Enter a new address", NEW_ADDRESS),
                PromptOption::new("Leave it", SKIP),
            ],
        },
        default: Some(SKIP.to_string()),
    })?;
    Ok(match choice.as_string().as_str() {
        ADD_SCHEME => Some(format!("https://{}", link.url)),
        NEW_ADDRESS => {
            let address = ui
                .prompt(&Prompt {
                    key: "readme_link_address".to_string(),
                    question: format!("New address for {}", link.url),
                    prompt_type: PromptType::Input,
                    default: Some(link.url.clone()),
                })?
                .as_string();
            Some(address).filter(|a| !a.trim().is_empty() && *a != link.url)
        }
        _ => None,
    })
}

/// Rewrite scheme-less links.
///
/// With `assume_yes` every link gets `https://`; otherwise the user picks per
/// link. Returns the new text and the number of links changed.
pub fn fix_relative_links(
    text: &str,
    ui: &mut dyn UserInterface,
    assume_yes: bool,
) -> Result<(String, usize)> {
    let mut fixed = text.to_string();
    let mut count = 0;
    for link in find_relative_links(text) {
        let replacement = if assume_yes {
            Some(format!("https://{}", link.url))
        } else {
            ask(&link, ui)?
        };
        if let Some(url) = replacement {
            fixed = fixed.replacen(&link.matched, &link.with_url(&url), 1);
            count += 1;
        }
    }
    Ok((fixed, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;

    const README: &str = "\
See [docs](www.example.com/docs) and [home](https://example.com).
![logo](img/logo.png) [top](#top) [mail](mailto:a@b.c)
<a href=\"example.org/path\">x</a> <a href=\"http://ok.com\">y</a>
";

    #[test]
    fn finds_only_scheme_less_links() {
        let links = find_relative_links(README);
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["www.example.com/docs", "example.org/path"]);
        assert_eq!(links[0].kind, LinkKind::Markdown);
        assert_eq!(links[1].kind, LinkKind::Html);
    }

    #[test]
    fn assume_yes_prefixes_https() {
        let mut ui = MockUI::new();
        let (fixed, count) = fix_relative_links(README, &mut ui, true).unwrap();
        assert_eq!(count, 2);
        assert!(fixed.contains("[docs](https://www.example.com/docs)"));
        assert!(fixed.contains("href=\"https://example.org/path\""));
        assert!(fixed.contains("![logo](img/logo.png)"));
        assert!(ui.prompts_shown().is_empty());
    }

    #[test]
    fn prompt_answers_drive_each_link() {
        let mut ui = MockUI::new();
        ui.queue_prompt_responses("readme_link", vec![NEW_ADDRESS, SKIP]);
        ui.set_prompt_response("readme_link_address", "https://docs.example.com");
        let (fixed, count) = fix_relative_links(README, &mut ui, false).unwrap();
        assert_eq!(count, 1);
        assert!(fixed.contains("[docs](https://docs.example.com)"));
        assert!(fixed.contains("href=\"example.org/path\""));
    }

    #[test]
    fn default_answer_leaves_links_alone() {
        let mut ui = MockUI::new();
        let (fixed, count) = fix_relative_links(README, &mut ui, false).unwrap();
        assert_eq!(count, 0);
        assert_eq!(fixed, README);
        assert_eq!(ui.prompts_shown().len(), 2);
    }
}

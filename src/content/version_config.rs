//! `version_config.json`: platform version bands to content version ranges.

use crate::content::version::{next_patch, parse_strict};
use semver::Version;
use serde_json::Value;

/// One platform-version band.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub platform: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Bands in file order. Returns `None` when the document is not an object.
pub fn bands(value: &Value) -> Option<Vec<Band>> {
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .map(|(platform, range)| Band {
                platform: platform.clone(),
                from: range.get("from").and_then(Value::as_str).map(str::to_string),
                to: range.get("to").and_then(Value::as_str).map(str::to_string),
            })
            .collect(),
    )
}

/// Every rule violation in the version config, in file order.
pub fn violations(value: &Value) -> Vec<String> {
    let Some(bands) = bands(value) else {
        return vec!["version_config.json must be a JSON object".to_string()];
    };

    let mut problems = Vec::new();
    let mut previous_platform: Option<Version> = None;

    for (index, band) in bands.iter().enumerate() {
        match parse_strict(&band.platform) {
            Some(platform) => {
                if let Some(prev) = &previous_platform {
                    if &platform <= prev {
                        problems.push(format!(
                            "platform version {} is not in ascending order",
                            band.platform
                        ));
                    }
                }
                previous_platform = Some(platform);
            }
            None => problems.push(format!(
                "platform version '{}' is not a valid semantic version",
                band.platform
            )),
        }

        let from = check_value(band, "from", band.from.as_deref(), &mut problems);
        let to = check_value(band, "to", band.to.as_deref(), &mut problems);

        if let (Some(from), Some(to)) = (&from, &to) {
            if from > to {
                problems.push(format!(
                    "band {}: from {} is greater than to {}",
                    band.platform, from, to
                ));
            }
        }

        let is_last = index + 1 == bands.len();
        if is_last {
            if band.to.is_some() {
                problems.push(format!(
                    "band {}: the last band must not declare 'to'",
                    band.platform
                ));
            }
            continue;
        }

        let next = &bands[index + 1];
        match (&to, next.from.as_deref().and_then(parse_strict)) {
            (None, _) if band.to.is_none() => problems.push(format!(
                "band {}: must declare 'to' because band {} follows",
                band.platform, next.platform
            )),
            (Some(to), Some(next_from)) => {
                let expected = next_patch(to);
                if next_from != expected {
                    problems.push(format!(
                        "band {}: 'from' should be {} to follow {} of band {}",
                        next.platform, expected, to, band.platform
                    ));
                }
            }
            (Some(_), None) if next.from.is_none() => problems.push(format!(
                "band {}: must declare 'from' because band {} closes",
                next.platform, band.platform
            )),
            _ => {}
        }
    }

    problems
}

fn check_value(
    band: &Band,
    key: &str,
    raw: Option<&str>,
    problems: &mut Vec<String>,
) -> Option<Version> {
    let raw = raw?;
    let parsed = parse_strict(raw);
    if parsed.is_none() {
        problems.push(format!(
            "band {}: '{}' value '{}' is not a valid semantic version",
            band.platform, key, raw
        ));
    }
    parsed
}

//! Closed vocabularies shared by the content model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every kind of content artifact the loader can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Integration,
    Script,
    Playbook,
    TestPlaybook,
    Classifier,
    Mapper,
    Dashboard,
    IncidentField,
    IncidentType,
    IndicatorField,
    IndicatorType,
    Layout,
    ParsingRule,
    ModelingRule,
    CorrelationRule,
    XDRCTemplate,
    GenericField,
    GenericType,
    GenericModule,
    GenericDefinition,
    Trigger,
    Widget,
    Wizard,
    Job,
    List,
    Pack,
    ReleaseNote,
    Report,
    AgentixAgent,
    AgentixAction,
}

impl ContentType {
    /// All content types, in declaration order.
    pub const ALL: [ContentType; 30] = [
        ContentType::Integration,
        ContentType::Script,
        ContentType::Playbook,
        ContentType::TestPlaybook,
        ContentType::Classifier,
        ContentType::Mapper,
        ContentType::Dashboard,
        ContentType::IncidentField,
        ContentType::IncidentType,
        ContentType::IndicatorField,
        ContentType::IndicatorType,
        ContentType::Layout,
        ContentType::ParsingRule,
        ContentType::ModelingRule,
        ContentType::CorrelationRule,
        ContentType::XDRCTemplate,
        ContentType::GenericField,
        ContentType::GenericType,
        ContentType::GenericModule,
        ContentType::GenericDefinition,
        ContentType::Trigger,
        ContentType::Widget,
        ContentType::Wizard,
        ContentType::Job,
        ContentType::List,
        ContentType::Pack,
        ContentType::ReleaseNote,
        ContentType::Report,
        ContentType::AgentixAgent,
        ContentType::AgentixAction,
    ];

    /// The pack sub-directory that holds this kind of content.
    pub fn directory(self) -> Option<&'static str> {
        Some(match self {
            ContentType::Integration => "Integrations",
            ContentType::Script => "Scripts",
            ContentType::Playbook => "Playbooks",
            ContentType::TestPlaybook => "TestPlaybooks",
            ContentType::Classifier | ContentType::Mapper => "Classifiers",
            ContentType::Dashboard => "Dashboards",
            ContentType::IncidentField => "IncidentFields",
            ContentType::IncidentType => "IncidentTypes",
            ContentType::IndicatorField => "IndicatorFields",
            ContentType::IndicatorType => "IndicatorTypes",
            ContentType::Layout => "Layouts",
            ContentType::ParsingRule => "ParsingRules",
            ContentType::ModelingRule => "ModelingRules",
            ContentType::CorrelationRule => "CorrelationRules",
            ContentType::XDRCTemplate => "XDRCTemplates",
            ContentType::GenericField => "GenericFields",
            ContentType::GenericType => "GenericTypes",
            ContentType::GenericModule => "GenericModules",
            ContentType::GenericDefinition => "GenericDefinitions",
            ContentType::Trigger => "Triggers",
            ContentType::Widget => "Widgets",
            ContentType::Wizard => "Wizards",
            ContentType::Job => "Jobs",
            ContentType::List => "Lists",
            ContentType::ReleaseNote => "ReleaseNotes",
            ContentType::Report => "Reports",
            ContentType::AgentixAgent => "AgentixAgents",
            ContentType::AgentixAction => "AgentixActions",
            ContentType::Pack => return None,
        })
    }

    /// The release-note header under which changes of this type are listed.
    pub fn release_note_header(self) -> Option<&'static str> {
        Some(match self {
            ContentType::Integration => "Integrations",
            ContentType::Script => "Scripts",
            ContentType::Playbook => "Playbooks",
            ContentType::Classifier => "Classifiers",
            ContentType::Mapper => "Mappers",
            ContentType::Dashboard => "Dashboards",
            ContentType::IncidentField => "Incident Fields",
            ContentType::IncidentType => "Incident Types",
            ContentType::IndicatorField => "Indicator Fields",
            ContentType::IndicatorType => "Indicator Types",
            ContentType::Layout => "Layouts",
            ContentType::ParsingRule => "Parsing Rules",
            ContentType::ModelingRule => "Modeling Rules",
            ContentType::CorrelationRule => "Correlation Rules",
            ContentType::XDRCTemplate => "XDRC Templates",
            ContentType::GenericField => "Object Fields",
            ContentType::GenericType => "Object Types",
            ContentType::GenericModule => "Modules",
            ContentType::GenericDefinition => "Objects",
            ContentType::Trigger => "Triggers Recommendations",
            ContentType::Widget => "Widgets",
            ContentType::Wizard => "Wizards",
            ContentType::Job => "Jobs",
            ContentType::List => "Lists",
            ContentType::Report => "Reports",
            _ => return None,
        })
    }

    /// Whether items of this type carry a `version: -1` marker.
    pub fn has_version_marker(self) -> bool {
        !matches!(
            self,
            ContentType::Pack
                | ContentType::ReleaseNote
                | ContentType::ParsingRule
                | ContentType::ModelingRule
                | ContentType::CorrelationRule
                | ContentType::AgentixAgent
                | ContentType::AgentixAction
        )
    }

    /// Whether the type is one of the YAML code-bearing types.
    pub fn is_code_item(self) -> bool {
        matches!(self, ContentType::Integration | ContentType::Script)
    }

    /// Whether the type is any kind of playbook.
    pub fn is_playbook(self) -> bool {
        matches!(self, ContentType::Playbook | ContentType::TestPlaybook)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A distribution target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marketplace {
    Xsoar,
    #[serde(rename = "marketplacev2")]
    MarketplaceV2,
    Xpanse,
    XsoarSaas,
    XsoarOnPrem,
}

impl Marketplace {
    pub const ALL: [Marketplace; 5] = [
        Marketplace::Xsoar,
        Marketplace::MarketplaceV2,
        Marketplace::Xpanse,
        Marketplace::XsoarSaas,
        Marketplace::XsoarOnPrem,
    ];

    /// Marketplaces assumed when an item or pack declares none.
    pub const DEFAULT: [Marketplace; 2] = [Marketplace::Xsoar, Marketplace::MarketplaceV2];

    pub fn as_str(self) -> &'static str {
        match self {
            Marketplace::Xsoar => "xsoar",
            Marketplace::MarketplaceV2 => "marketplacev2",
            Marketplace::Xpanse => "xpanse",
            Marketplace::XsoarSaas => "xsoar_saas",
            Marketplace::XsoarOnPrem => "xsoar_on_prem",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s.trim())
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a file relative to the git base ref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GitStatus {
    Added,
    Modified,
    Renamed,
    Deleted,
}

impl GitStatus {
    /// Parse the status letter emitted by `git diff --name-status`.
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter.chars().next()? {
            'A' | 'C' => Some(GitStatus::Added),
            'M' | 'T' => Some(GitStatus::Modified),
            'R' => Some(GitStatus::Renamed),
            'D' => Some(GitStatus::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for GitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            GitStatus::Added => "A",
            GitStatus::Modified => "M",
            GitStatus::Renamed => "R",
            GitStatus::Deleted => "D",
        };
        f.write_str(letter)
    }
}

/// Support tier of a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Support {
    #[default]
    Xsoar,
    Partner,
    Community,
    Developer,
}

impl Support {
    pub fn as_str(self) -> &'static str {
        match self {
            Support::Xsoar => "xsoar",
            Support::Partner => "partner",
            Support::Community => "community",
            Support::Developer => "developer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xsoar" => Some(Support::Xsoar),
            "partner" => Some(Support::Partner),
            "community" => Some(Support::Community),
            "developer" => Some(Support::Developer),
            _ => None,
        }
    }
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of auxiliary files that travel with an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelatedFileKind {
    Readme,
    Description,
    Image,
    DarkSvg,
    LightSvg,
    Code,
    TestCode,
    Schema,
    Xif,
    PackIgnore,
    SecretsIgnore,
    AuthorImage,
    ReleaseNote,
    VersionConfig,
    SystemInstructions,
    TestUseCase,
}

impl RelatedFileKind {
    /// How the related file's content is decoded.
    pub fn encoding(self) -> RelatedEncoding {
        match self {
            RelatedFileKind::Image | RelatedFileKind::AuthorImage => RelatedEncoding::Binary,
            RelatedFileKind::Schema | RelatedFileKind::VersionConfig => RelatedEncoding::Json,
            _ => RelatedEncoding::Text,
        }
    }
}

impl fmt::Display for RelatedFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Decoding applied to a related file's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedEncoding {
    Text,
    Json,
    Binary,
}

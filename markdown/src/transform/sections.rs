//! Level-2 section names recognized inside a command.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Synopsis,
    Syntax,
    Description,
    Examples,
    Parameters,
    Inputs,
    Outputs,
    Notes,
    RelatedLinks,
}

impl SectionKind {
    /// Identifies a section heading, ignoring case, repeated whitespace and a
    /// trailing colon.
    ///
    /// Returns `None` when the heading is not a known section.
    pub fn from_heading(text: &str) -> Option<Self> {
        let trimmed = text.trim().trim_end_matches(':');
        let compact = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");

        match compact.to_ascii_uppercase().as_str() {
            "SYNOPSIS" => Some(Self::Synopsis),
            "SYNTAX" => Some(Self::Syntax),
            "DESCRIPTION" => Some(Self::Description),
            "EXAMPLES" => Some(Self::Examples),
            "PARAMETERS" => Some(Self::Parameters),
            "INPUTS" => Some(Self::Inputs),
            "OUTPUTS" => Some(Self::Outputs),
            "NOTES" => Some(Self::Notes),
            "RELATED LINKS" => Some(Self::RelatedLinks),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_heading_normalizes() {
        assert_eq!(SectionKind::from_heading("SYNOPSIS"), Some(SectionKind::Synopsis));
        assert_eq!(SectionKind::from_heading("  Examples: "), Some(SectionKind::Examples));
        assert_eq!(
            SectionKind::from_heading("related   links"),
            Some(SectionKind::RelatedLinks)
        );
        assert_eq!(SectionKind::from_heading("ALIASES"), None);
    }
}

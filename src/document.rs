//! Splits an input document into its three sections.
//!
//! ```text
//! #FuzzySets
//! Temp
//! Cold(0,10,5,5)
//! ...
//! #Rulebase
//! Cooling
//! Rule1: if temp is cold then fan is slow
//! ...
//! #Measurements
//! temp = 30
//! ```

use std::fmt;

use crate::error::Error;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Section {
    Rulebase,
    FuzzySets,
    Measurements,
}

impl Section {
    const ALL: [Section; 3] = [Section::Rulebase, Section::FuzzySets, Section::Measurements];

    fn from_header(line: &str) -> Option<Self> {
        let header = line.strip_prefix('#')?;

        Self::ALL
            .into_iter()
            .find(|section| header.eq_ignore_ascii_case(section.as_str()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rulebase => "rulebase",
            Self::FuzzySets => "fuzzysets",
            Self::Measurements => "measurements",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lowercased, non-empty lines of each section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub rulebase: Vec<String>,
    pub fuzzy_sets: Vec<String>,
    pub measurements: Vec<String>,
}

impl Document {
    /// A header line switches the section the following lines belong to. Lines
    /// before the first header are ignored. All three headers are required.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut document = Document::default();
        let mut seen = [false; 3];
        let mut current = None;

        for line in text.lines() {
            let line = line.trim();

            if let Some(section) = Section::from_header(line) {
                seen[section as usize] = true;
                current = Some(section);
                continue;
            }

            if line.is_empty() {
                continue;
            }

            if let Some(section) = current {
                document.lines_mut(section).push(line.to_lowercase());
            }
        }

        match Section::ALL.into_iter().find(|section| !seen[*section as usize]) {
            Some(missing) => Err(Error::MissingSection(missing)),
            None => Ok(document),
        }
    }

    pub fn lines(&self, section: Section) -> &[String] {
        match section {
            Section::Rulebase => &self.rulebase,
            Section::FuzzySets => &self.fuzzy_sets,
            Section::Measurements => &self.measurements,
        }
    }

    fn lines_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::Rulebase => &mut self.rulebase,
            Section::FuzzySets => &mut self.fuzzy_sets,
            Section::Measurements => &mut self.measurements,
        }
    }
}

#[test]
fn test_parse_sections() {
    let text = "\
ignored preamble
#FuzzySets
Temp
Cold(0,10,5,5)

#Rulebase
Cooling
Rule1: if Temp is Cold then Fan is Slow
#MEASUREMENTS
Temp = 3
";
    let document = Document::parse(text).unwrap();

    assert_eq!(document.fuzzy_sets, vec!["temp", "cold(0,10,5,5)"]);
    assert_eq!(document.lines(Section::Rulebase)[1], "rule1: if temp is cold then fan is slow");
    assert_eq!(document.measurements, vec!["temp = 3"]);
}

#[test]
fn test_sections_may_repeat() {
    let document = Document::parse("#rulebase\na\n#fuzzysets\nb\n#measurements\nc\n#rulebase\nd").unwrap();

    assert_eq!(document.rulebase, vec!["a", "d"]);
}

#[test]
fn test_missing_section() {
    assert_eq!(
        Document::parse("#rulebase\n#fuzzysets\n"),
        Err(Error::MissingSection(Section::Measurements))
    );
    assert_eq!(Document::parse(""), Err(Error::MissingSection(Section::Rulebase)));
}

use crate::FindError;
use regex::Regex;
use std::path::Path;

/**
 Narrows which entries a traversal hands back.

 The two default matchers look at different parts of the path: [`Pattern::Name`] compares the
 base name only, while [`Pattern::Regex`] is tested against the full path. Use
 [`Pattern::NameRegex`] to run a regex against the base name alone.

 # Examples
 ```
 use rfind::Pattern;
 use std::path::Path;

 assert!(Pattern::from("a.txt").matches(Path::new("/tmp/t/a.txt")));
 assert!(!Pattern::from("t").matches(Path::new("/tmp/t/a.txt")));

 let txt = Pattern::regex(r"\.txt$").unwrap();
 assert!(txt.matches(Path::new("/tmp/t/a.txt")));

 // full path regexes see the directories too
 let under_t = Pattern::regex("/t/").unwrap();
 assert!(under_t.matches(Path::new("/tmp/t/a.txt")));
 ```
*/
#[derive(Debug, Clone, Default)]
pub enum Pattern {
    /// Matches everything
    #[default]
    Any,
    /// Exact base name
    Name(String),
    /// Regex tested against the full path
    Regex(Regex),
    /// Regex tested against the base name
    NameRegex(Regex),
}

impl Pattern {
    /// Exact base name match
    #[must_use]
    pub fn name<S: Into<String>>(name: S) -> Self {
        Self::Name(name.into())
    }

    /**
     Compiles a regex that is tested against the full path

     # Errors
     Returns [`FindError::InvalidPattern`] if the regex does not compile
    */
    pub fn regex(pattern: &str) -> Result<Self, FindError> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    /**
     Compiles a regex that is tested against the base name only

     # Errors
     Returns [`FindError::InvalidPattern`] if the regex does not compile
    */
    pub fn name_regex(pattern: &str) -> Result<Self, FindError> {
        Ok(Self::NameRegex(Regex::new(pattern)?))
    }

    /// Returns true if this pattern lets everything through
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Tests `path` against the pattern, non UTF-8 paths are compared lossily
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Self::Any => true,
            Self::Name(name) => path
                .file_name()
                .is_some_and(|base| base.to_string_lossy() == name.as_str()),
            Self::Regex(regex) => regex.is_match(&path.to_string_lossy()),
            Self::NameRegex(regex) => path
                .file_name()
                .is_some_and(|base| regex.is_match(&base.to_string_lossy())),
        }
    }
}

impl From<&str> for Pattern {
    fn from(name: &str) -> Self {
        Self::name(name)
    }
}

impl From<String> for Pattern {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

//! Line-oriented list files.
//!
//! All three external interfaces of Wharf are plain-text files with one
//! entry per line: the public-header list, the forced-linkage list, and
//! the consumer-side dependency list. Blank lines and `#` comments are
//! ignored everywhere.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::descriptor::{compose_identity, DEFAULT_CONFIGURATION};
use crate::util::fs;

/// Default public-header list file name, at the project root.
pub const HEADER_LIST_NAME: &str = "Headers.list";

/// Default forced-linkage list file name, at the project root.
pub const FORCELINK_LIST_NAME: &str = "ForceLink.list";

/// Default dependency-declaration list file name, at the consumer workspace root.
pub const DEPS_LIST_NAME: &str = "Deps.list";

/// Read the meaningful lines of a list file.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Load a list of file paths, resolving relative entries against `root`.
pub fn load_path_list(root: &Path, list: &Path) -> Result<Vec<PathBuf>> {
    let lines = read_lines(list)
        .with_context(|| format!("failed to load list file: {}", list.display()))?;

    Ok(lines
        .into_iter()
        .map(|line| {
            let path = PathBuf::from(line);
            if path.is_absolute() {
                path
            } else {
                root.join(path)
            }
        })
        .collect())
}

/// A consumer-side dependency declaration: `name [version] [configuration]`.
///
/// The configuration token defaults to `Release`; package directory names
/// embed the configuration, so the synchronizer needs one to compose an
/// exact directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub version: Option<String>,
    pub configuration: String,
}

impl Declaration {
    /// Parse one declaration line.
    pub fn parse(line: &str) -> Result<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            [name] => Ok(Declaration {
                name: (*name).to_string(),
                version: None,
                configuration: DEFAULT_CONFIGURATION.to_string(),
            }),
            [name, version] => Ok(Declaration {
                name: (*name).to_string(),
                version: Some((*version).to_string()),
                configuration: DEFAULT_CONFIGURATION.to_string(),
            }),
            [name, version, configuration] => Ok(Declaration {
                name: (*name).to_string(),
                version: Some((*version).to_string()),
                configuration: (*configuration).to_string(),
            }),
            _ => bail!(
                "invalid dependency declaration `{}` (expected `name [version] [configuration]`)",
                line
            ),
        }
    }

    /// The repository directory name this declaration resolves to.
    pub fn identity(&self) -> String {
        compose_identity(&self.name, self.version.as_deref(), &self.configuration)
    }
}

/// Load all declarations from a dependency list file.
pub fn load_declarations(path: &Path) -> Result<Vec<Declaration>> {
    let lines = read_lines(path)
        .with_context(|| format!("failed to load dependency list: {}", path.display()))?;

    lines.iter().map(|line| Declaration::parse(line)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_path_list() {
        let tmp = TempDir::new().unwrap();
        let list = tmp.path().join(HEADER_LIST_NAME);
        std::fs::write(
            &list,
            "# public headers\ninclude/mylib.h\n\ninclude/mylib_net.h\n",
        )
        .unwrap();

        let paths = load_path_list(tmp.path(), &list).unwrap();

        assert_eq!(
            paths,
            vec![
                tmp.path().join("include/mylib.h"),
                tmp.path().join("include/mylib_net.h"),
            ]
        );
    }

    #[test]
    fn test_load_path_list_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_path_list(tmp.path(), &tmp.path().join("nope.list"));
        assert!(result.is_err());
    }

    #[test]
    fn test_declaration_parse_name_only() {
        let decl = Declaration::parse("mylib").unwrap();
        assert_eq!(decl.name, "mylib");
        assert_eq!(decl.version, None);
        assert_eq!(decl.configuration, DEFAULT_CONFIGURATION);
        assert_eq!(decl.identity(), "mylib-Release");
    }

    #[test]
    fn test_declaration_parse_full() {
        let decl = Declaration::parse("mylib 1.2 Debug").unwrap();
        assert_eq!(decl.version.as_deref(), Some("1.2"));
        assert_eq!(decl.configuration, "Debug");
        assert_eq!(decl.identity(), "mylib-1.2-Debug");
    }

    #[test]
    fn test_declaration_parse_too_many_tokens() {
        assert!(Declaration::parse("a b c d").is_err());
    }

    #[test]
    fn test_load_declarations() {
        let tmp = TempDir::new().unwrap();
        let list = tmp.path().join(DEPS_LIST_NAME);
        std::fs::write(&list, "mylib 1.2\n# comment\nother\n").unwrap();

        let decls = load_declarations(&list).unwrap();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].identity(), "mylib-1.2-Release");
        assert_eq!(decls[1].identity(), "other-Release");
    }
}

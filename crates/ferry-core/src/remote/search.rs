// ── Keyword / extension search over a single remote listing ─────────────────

use crate::remote::connection::RemoteConnection;
use crate::remote::error::RemoteResult;
use crate::remote::types::RemoteEntry;
use log::info;

/// Filename predicate applied to each file of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Substring match on the file name.
    Keyword(String),
    /// Suffix match on the file name; always stored with its leading dot.
    Extension(String),
}

impl SearchFilter {
    pub fn keyword(keyword: &str) -> Self {
        Self::Keyword(keyword.to_string())
    }

    /// `"txt"` and `".txt"` both become `".txt"`.
    pub fn extension(ext: &str) -> Self {
        if ext.starts_with('.') {
            Self::Extension(ext.to_string())
        } else {
            Self::Extension(format!(".{}", ext))
        }
    }

    pub fn matches(&self, entry: &RemoteEntry) -> bool {
        if !entry.is_file() {
            return false;
        }
        match self {
            Self::Keyword(k) => entry.name.contains(k.as_str()),
            Self::Extension(e) => entry.name.ends_with(e.as_str()),
        }
    }
}

/// List `path` once and return the files accepted by `filter`.
///
/// An empty `path` returns nothing without touching the connection.
pub fn find_matches<C>(
    conn: &mut C,
    path: &str,
    filter: &SearchFilter,
) -> RemoteResult<Vec<RemoteEntry>>
where
    C: RemoteConnection + ?Sized,
{
    if path.is_empty() {
        return Ok(Vec::new());
    }

    let matches: Vec<RemoteEntry> = conn
        .list_directory(path)?
        .into_iter()
        .filter(|e| !e.is_pseudo() && filter.matches(e))
        .collect();

    if !matches.is_empty() {
        info!("Search in {} matched {} file(s):", path, matches.len());
        for entry in &matches {
            info!("  {}", entry.name);
        }
    }

    Ok(matches)
}

pub fn count_with_keyword<C>(conn: &mut C, path: &str, keyword: &str) -> RemoteResult<usize>
where
    C: RemoteConnection + ?Sized,
{
    if path.is_empty() || keyword.is_empty() {
        return Ok(0);
    }
    Ok(find_matches(conn, path, &SearchFilter::keyword(keyword))?.len())
}

pub fn count_with_extension<C>(conn: &mut C, path: &str, extension: &str) -> RemoteResult<usize>
where
    C: RemoteConnection + ?Sized,
{
    if path.is_empty() || extension.is_empty() {
        return Ok(0);
    }
    Ok(find_matches(conn, path, &SearchFilter::extension(extension))?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::connection::MockRemoteConnection;
    use crate::remote::types::EntryKind;
    use mockall::predicate::eq;

    fn entry(name: &str, kind: EntryKind) -> RemoteEntry {
        RemoteEntry {
            name: name.to_string(),
            kind,
            size: 1,
            modified: None,
        }
    }

    fn listing() -> Vec<RemoteEntry> {
        vec![
            entry(".", EntryKind::Directory),
            entry("foo.txt", EntryKind::File),
            entry("bar.TXT", EntryKind::File),
            entry("food", EntryKind::Directory),
            entry("notes.md", EntryKind::File),
        ]
    }

    #[test]
    fn extension_is_normalised() {
        assert_eq!(SearchFilter::extension("txt"), SearchFilter::extension(".txt"));
    }

    #[test]
    fn keyword_counts_files_only() {
        let mut conn = MockRemoteConnection::new();
        conn.expect_list_directory()
            .with(eq("/docs"))
            .times(1)
            .returning(|_| Ok(listing()));

        assert_eq!(count_with_keyword(&mut conn, "/docs", "foo").unwrap(), 1);
    }

    #[test]
    fn extension_match_is_case_sensitive_suffix() {
        let mut conn = MockRemoteConnection::new();
        conn.expect_list_directory().times(2).returning(|_| Ok(listing()));

        assert_eq!(count_with_extension(&mut conn, "/docs", "txt").unwrap(), 1);
        assert_eq!(count_with_extension(&mut conn, "/docs", ".md").unwrap(), 1);
    }

    #[test]
    fn empty_arguments_never_reach_the_connection() {
        // No expectations: any call into the mock would panic.
        let mut conn = MockRemoteConnection::new();

        assert_eq!(count_with_keyword(&mut conn, "", "foo").unwrap(), 0);
        assert_eq!(count_with_keyword(&mut conn, "/docs", "").unwrap(), 0);
        assert_eq!(count_with_extension(&mut conn, "", "txt").unwrap(), 0);
        assert_eq!(count_with_extension(&mut conn, "/docs", "").unwrap(), 0);
    }
}

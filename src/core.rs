pub type Result<T> = std::result::Result<T, anyhow::Error>;

pub(crate) mod utils {
    /// Lexically normalizes a POSIX path string.
    ///
    /// Removes `.` segments and redundant separators and collapses `..`
    /// segments without touching the filesystem (symlinks are not resolved).
    /// Exactly two leading slashes are preserved, as POSIX requires; one or
    /// three and more collapse to a single root slash. An empty input
    /// normalizes to `.`.
    pub fn normalize(path: &str) -> String {
        if path.is_empty() {
            return String::from(".");
        }

        let leading = path.len() - path.trim_start_matches('/').len();
        let root = match leading {
            0 => "",
            2 => "//",
            _ => "/",
        };

        // A ".." above an absolute root is dropped: "/.." is "/"
        let mut comps: Vec<&str> = Vec::new();
        for comp in path.split('/') {
            if comp.is_empty() || comp == "." {
                continue;
            }
            if comp != ".."
                || (root.is_empty() && comps.is_empty())
                || comps.last() == Some(&"..")
            {
                comps.push(comp);
            } else if !comps.is_empty() {
                comps.pop();
            }
        }

        let joined = comps.join("/");
        if root.is_empty() && joined.is_empty() {
            String::from(".")
        } else {
            format!("{root}{joined}")
        }
    }

}

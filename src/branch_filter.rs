use std::collections::BTreeSet;

/// Branch allow-list. An empty list applies no filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchFilter {
    allowed: BTreeSet<String>,
}

impl BranchFilter {
    /// Parses a space-delimited list of branch names.
    pub fn from_input(input: &str) -> Self {
        let allowed = input.split_whitespace().map(str::to_string).collect();
        Self { allowed }
    }

    pub fn is_configured(&self) -> bool {
        !self.allowed.is_empty()
    }

    pub fn is_allowed(&self, branch: &str) -> bool {
        !self.is_configured() || self.allowed.contains(branch)
    }
}

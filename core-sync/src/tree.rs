//! Result tree for notification text.
//!
//! A plain ownership tree built bottom-up during the mirror pass and
//! merged explicitly, decoupled from the diff/save logic that produces
//! it. Rendered as the indented body of the per-account notification.

/// One node: a display label, the remote id it came from, and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTree {
    pub label: String,
    pub fid: String,
    pub children: Vec<ReportTree>,
}

impl ReportTree {
    pub fn new(label: impl Into<String>, fid: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fid: fid.into(),
            children: Vec::new(),
        }
    }

    /// Append a leaf under this node.
    pub fn add_leaf(&mut self, label: impl Into<String>, fid: impl Into<String>) {
        self.children.push(ReportTree::new(label, fid));
    }

    /// Graft a subtree produced by a recursion level under a new labeled
    /// node, keyed by the subdirectory's remote id.
    pub fn add_subtree(
        &mut self,
        label: impl Into<String>,
        fid: impl Into<String>,
        subtree: ReportTree,
    ) {
        let mut node = ReportTree::new(label, fid);
        node.children = subtree.children;
        self.children.push(node);
    }

    /// Number of descendants (the root label itself not counted).
    pub fn size(&self) -> usize {
        self.children.iter().map(|c| 1 + c.size()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Render as indented text, root label first.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.label);
        for child in &self.children {
            child.render_into(&mut out, 1);
        }
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        out.push('\n');
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(&self.label);
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

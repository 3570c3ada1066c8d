/// Tracks the property elements enclosing the current reader position.
///
/// Each open property element is pushed with its `name` attribute, so the
/// stack length is the nesting depth and text is template source iff the
/// depth is non-zero.
#[derive(Debug, Default)]
pub(crate) struct PropertyRegion {
    open: Vec<Option<String>>,
}

impl PropertyRegion {
    #[inline]
    pub(crate) fn enter(&mut self, name: Option<String>) {
        self.open.push(name);
    }

    /// Close the innermost property. Unbalanced end tags leave the depth at 0.
    #[inline]
    pub(crate) fn leave(&mut self) {
        self.open.pop();
    }

    #[inline]
    pub(crate) fn is_open(&self) -> bool {
        !self.open.is_empty()
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.open.len()
    }

    /// Name of the innermost open property that has one.
    pub(crate) fn current_name(&self) -> Option<&str> {
        self.open.iter().rev().find_map(|name| name.as_deref())
    }
}

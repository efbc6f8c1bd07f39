use crate::ir::Person;

/// Per-depth horizontal extent of a subtree: `(left, right)` for each
/// generation, starting with the subtree root's own row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub levels: Vec<(f32, f32)>,
}

impl Contour {
    pub fn single(left: f32, right: f32) -> Self {
        Self {
            levels: vec![(left, right)],
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Widens this contour with `other` shifted right by `offset`, level by
    /// level, starting `skip` levels down.
    pub fn merge(&mut self, other: &Contour, offset: f32, skip: usize) {
        for (idx, (left, right)) in other.levels.iter().enumerate() {
            let level = idx + skip;
            let (left, right) = (left + offset, right + offset);
            match self.levels.get_mut(level) {
                Some(slot) => {
                    slot.0 = slot.0.min(left);
                    slot.1 = slot.1.max(right);
                }
                None => self.levels.push((left, right)),
            }
        }
    }

    /// Smallest rightward shift for `next` so that at every shared depth it
    /// starts at least `gap` after this contour ends. The result packs to
    /// equality: the tightest level ends exactly `gap` before `next` starts.
    /// Zero when the two contours share no depth.
    pub fn separation(&self, next: &Contour, gap: f32) -> f32 {
        let shift = self
            .levels
            .iter()
            .zip(next.levels.iter())
            .map(|((_, right), (left, _))| right + gap - left)
            .fold(f32::NEG_INFINITY, f32::max);
        if shift.is_finite() { shift } else { 0.0 }
    }

    pub fn leftmost(&self) -> f32 {
        self.levels
            .iter()
            .map(|(left, _)| *left)
            .fold(f32::INFINITY, f32::min)
    }
}

/// One person placed in a family hierarchy.
///
/// Primary nodes own a spouse column and the couple's children. Parent stubs
/// (entries of `parents`) are shallow: they exist so an incoming edge can be
/// drawn and are never positioned or expanded.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub person: Person,
    pub spouse: Option<Box<HierarchyNode>>,
    pub children: Vec<HierarchyNode>,
    pub parents: Vec<HierarchyNode>,
    pub x: f32,
    pub y: f32,
    pub(crate) prelim: f32,
    pub(crate) modifier: f32,
    pub(crate) contour: Contour,
}

impl HierarchyNode {
    pub fn new(person: Person) -> Self {
        Self {
            person,
            spouse: None,
            children: Vec::new(),
            parents: Vec::new(),
            x: 0.0,
            y: 0.0,
            prelim: 0.0,
            modifier: 0.0,
            contour: Contour::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.person.id
    }

    pub fn is_pinned(&self) -> bool {
        self.person.placement.is_pinned()
    }

    /// Contour computed by the last layout pass, in the node's local frame.
    pub fn contour(&self) -> &Contour {
        &self.contour
    }

    /// Visits this node, its spouse and every descendant, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a HierarchyNode, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a HierarchyNode, usize)) {
        visit(self, depth);
        if let Some(spouse) = self.spouse.as_deref() {
            visit(spouse, depth);
        }
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    pub fn find(&self, person_id: &str) -> Option<&HierarchyNode> {
        let mut found = None;
        self.walk(&mut |node, _| {
            if found.is_none() && node.id() == person_id {
                found = Some(node);
            }
        });
        found
    }

    /// Person ids placed as primary (positioned) nodes, in traversal order.
    pub fn placed_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.walk(&mut |node, _| ids.push(node.id()));
        ids
    }
}

/// Horizontal span occupied by one laid-out tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeBounds {
    pub min_x: f32,
    pub max_x: f32,
}

#[derive(Debug, Clone)]
pub struct GridPlacement {
    pub person: Person,
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned box around everything placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min_x: f32::MAX,
            min_y: f32::MAX,
            max_x: f32::MIN,
            max_y: f32::MIN,
        }
    }

    pub fn include(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x + width);
        self.max_y = self.max_y.max(y + height);
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    pub fn width(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

/// Output of a layout pass: positioned trees plus the unconnected grid.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub forest: Vec<HierarchyNode>,
    pub trees: Vec<TreeBounds>,
    pub unconnected: Vec<GridPlacement>,
    pub bounds: Bounds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separation_packs_to_exact_gap() {
        let mut left = Contour::single(0.0, 200.0);
        left.merge(&Contour::single(-100.0, 300.0), 0.0, 1);
        let right = Contour::single(0.0, 200.0);
        // deepest shared level is the row itself
        assert_eq!(left.separation(&right, 50.0), 250.0);

        let mut deep = Contour::single(0.0, 200.0);
        deep.merge(&Contour::single(0.0, 200.0), 0.0, 1);
        assert_eq!(left.separation(&deep, 50.0), 350.0);
        assert_eq!(Contour::default().separation(&right, 50.0), 0.0);
    }
}

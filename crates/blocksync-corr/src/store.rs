//! The correspondence store.
//!
//! Correspondences are kept in creation order and indexed by every element
//! they mention, so queries from either side are cheap and iterate in a
//! stable order. The index is derived state and is rebuilt after loading.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use blocksync_model::{ElementId, ElementKind, ElementRef};

use crate::error::CorrespondenceError;

/// Sequential identifier of a correspondence within one store.
pub type CorrespondenceId = u64;

/// A link between block-domain and component-domain elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correspondence {
    pub id: CorrespondenceId,
    pub source: BTreeSet<ElementRef>,
    pub target: BTreeSet<ElementRef>,
}

impl Correspondence {
    /// Whether this correspondence mentions `element` on either side.
    pub fn involves(&self, element: ElementId) -> bool {
        self.elements().any(|e| e.id == element)
    }

    /// Every element on both sides, source side first.
    pub fn elements(&self) -> impl Iterator<Item = &ElementRef> {
        self.source.iter().chain(self.target.iter())
    }
}

/// Bidirectional many-to-many store of correspondences for one model pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrespondenceStore {
    correspondences: BTreeMap<CorrespondenceId, Correspondence>,
    next_id: CorrespondenceId,
    /// Primitive-type repository created for this model pair, if any.
    primitive_repository: Option<ElementRef>,
    #[serde(skip)]
    index: BTreeMap<ElementId, BTreeSet<CorrespondenceId>>,
}

impl CorrespondenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a set of source elements to a set of target elements.
    ///
    /// Linking exactly the same sets twice returns the existing
    /// correspondence instead of creating a duplicate.
    pub fn link(
        &mut self,
        source: impl IntoIterator<Item = ElementRef>,
        target: impl IntoIterator<Item = ElementRef>,
    ) -> Result<CorrespondenceId, CorrespondenceError> {
        let source: BTreeSet<_> = source.into_iter().collect();
        let target: BTreeSet<_> = target.into_iter().collect();
        if source.is_empty() || target.is_empty() {
            return Err(CorrespondenceError::EmptySide);
        }

        if let Some(existing) = self.find_exact(&source, &target) {
            debug!(id = existing, "correspondence already present");
            return Ok(existing);
        }

        let id = self.next_id;
        self.next_id += 1;
        let correspondence = Correspondence { id, source, target };
        for e in correspondence.elements() {
            self.index.entry(e.id).or_default().insert(id);
        }
        debug!(id, "linked {}", describe(&correspondence));
        self.correspondences.insert(id, correspondence);
        Ok(id)
    }

    /// Link a single source element to a single target element.
    pub fn link_one(
        &mut self,
        source: ElementRef,
        target: ElementRef,
    ) -> Result<CorrespondenceId, CorrespondenceError> {
        self.link([source], [target])
    }

    pub fn get(&self, id: CorrespondenceId) -> Option<&Correspondence> {
        self.correspondences.get(&id)
    }

    /// Correspondences mentioning `element`, oldest first.
    pub fn correspondences_of(&self, element: ElementId) -> Vec<&Correspondence> {
        self.index
            .get(&element)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.correspondences.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First element of kind `kind` linked to `element` by any
    /// correspondence. `element` itself is never returned.
    pub fn first_of_kind(&self, element: ElementId, kind: ElementKind) -> Option<ElementRef> {
        self.correspondences_of(element)
            .into_iter()
            .flat_map(|c| c.elements())
            .find(|e| e.id != element && e.kind.is_a(kind))
            .copied()
    }

    /// Every element of kind `kind` linked to `element`, without repeats.
    pub fn all_of_kind(&self, element: ElementId, kind: ElementKind) -> Vec<ElementRef> {
        let mut seen = BTreeSet::new();
        self.correspondences_of(element)
            .into_iter()
            .flat_map(|c| c.elements())
            .filter(|e| e.id != element && e.kind.is_a(kind))
            .filter(|e| seen.insert(e.id))
            .copied()
            .collect()
    }

    /// Whether any correspondence mentions `element`.
    pub fn is_linked(&self, element: ElementId) -> bool {
        self.index.get(&element).is_some_and(|ids| !ids.is_empty())
    }

    /// Delete every correspondence mentioning any of `elements`, on either
    /// side. Returns the number of correspondences removed.
    pub fn remove_involving(&mut self, elements: impl IntoIterator<Item = ElementId>) -> usize {
        let mut doomed = BTreeSet::new();
        for element in elements {
            if let Some(ids) = self.index.get(&element) {
                doomed.extend(ids.iter().copied());
            }
        }

        for id in &doomed {
            if let Some(c) = self.correspondences.remove(id) {
                for e in c.elements() {
                    if let Some(ids) = self.index.get_mut(&e.id) {
                        ids.remove(id);
                        if ids.is_empty() {
                            self.index.remove(&e.id);
                        }
                    }
                }
                debug!(id, "removed {}", describe(&c));
            }
        }
        doomed.len()
    }

    /// Iterate over all correspondences, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Correspondence> {
        self.correspondences.values()
    }

    pub fn len(&self) -> usize {
        self.correspondences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.correspondences.is_empty()
    }

    /// The primitive-type repository of this model pair, once created.
    pub fn primitive_repository(&self) -> Option<ElementRef> {
        self.primitive_repository
    }

    /// Record that the primitive-type repository has been created.
    pub fn set_primitive_repository(&mut self, repository: ElementRef) {
        self.primitive_repository = Some(repository);
    }

    /// Rebuild the element index from the stored correspondences.
    pub(crate) fn rebuild_index(&mut self) {
        self.index.clear();
        for (id, c) in &self.correspondences {
            for e in c.elements() {
                self.index.entry(e.id).or_default().insert(*id);
            }
        }
    }

    fn find_exact(
        &self,
        source: &BTreeSet<ElementRef>,
        target: &BTreeSet<ElementRef>,
    ) -> Option<CorrespondenceId> {
        let first = source.iter().next()?;
        self.correspondences_of(first.id)
            .into_iter()
            .find(|c| &c.source == source && &c.target == target)
            .map(|c| c.id)
    }
}

fn describe(c: &Correspondence) -> String {
    let side = |set: &BTreeSet<ElementRef>| {
        set.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{{{}}} <-> {{{}}}", side(&c.source), side(&c.target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn r(kind: ElementKind) -> ElementRef {
        ElementRef::new(ElementId::new(), kind)
    }

    #[test]
    fn empty_store() {
        let store = CorrespondenceStore::new();
        assert!(store.is_empty());
        assert_eq!(store.first_of_kind(ElementId::new(), ElementKind::Block), None);
        assert!(store.primitive_repository().is_none());
    }

    #[test]
    fn link_and_query_both_sides() {
        let mut store = CorrespondenceStore::new();
        let block = r(ElementKind::Block);
        let comp = r(ElementKind::MessageComponent);
        store.link_one(block, comp).unwrap();

        assert_eq!(store.first_of_kind(block.id, ElementKind::Component), Some(comp));
        assert_eq!(
            store.first_of_kind(block.id, ElementKind::MessageComponent),
            Some(comp)
        );
        assert_eq!(store.first_of_kind(block.id, ElementKind::MethodComponent), None);
        assert_eq!(store.first_of_kind(comp.id, ElementKind::Block), Some(block));
    }

    #[test]
    fn empty_side_rejected() {
        let mut store = CorrespondenceStore::new();
        let result = store.link([r(ElementKind::Block)], []);
        assert!(matches!(result, Err(CorrespondenceError::EmptySide)));
    }

    #[test]
    fn duplicate_link_is_reused() {
        let mut store = CorrespondenceStore::new();
        let block = r(ElementKind::Block);
        let comp = r(ElementKind::MethodComponent);
        let a = store.link_one(block, comp).unwrap();
        let b = store.link_one(block, comp).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn element_in_several_correspondences() {
        let mut store = CorrespondenceStore::new();
        let port = r(ElementKind::Port);
        let p1 = r(ElementKind::Parameter);
        let p2 = r(ElementKind::Parameter);
        let ret = r(ElementKind::ReturnValue);
        store.link_one(port, p1).unwrap();
        store.link_one(port, p2).unwrap();
        store.link_one(port, ret).unwrap();

        assert_eq!(store.first_of_kind(port.id, ElementKind::Parameter), Some(p1));
        assert_eq!(store.all_of_kind(port.id, ElementKind::Parameter), vec![p1, p2]);
        assert_eq!(store.correspondences_of(port.id).len(), 3);
    }

    #[test]
    fn many_to_many() {
        let mut store = CorrespondenceStore::new();
        let a = r(ElementKind::Block);
        let b = r(ElementKind::Port);
        let c = r(ElementKind::Message);
        store.link([a, b], [c]).unwrap();
        assert_eq!(store.first_of_kind(c.id, ElementKind::Port), Some(b));
        assert_eq!(store.first_of_kind(a.id, ElementKind::Port), Some(b));
    }

    #[test]
    fn cascade_removal_from_either_side() {
        let mut store = CorrespondenceStore::new();
        let block = r(ElementKind::Block);
        let comp = r(ElementKind::MessageComponent);
        let port = r(ElementKind::Port);
        let msg = r(ElementKind::Message);
        store.link_one(block, comp).unwrap();
        store.link_one(port, msg).unwrap();

        assert_eq!(store.remove_involving([msg.id]), 1);
        assert!(!store.is_linked(port.id));
        assert!(store.is_linked(block.id));

        assert_eq!(store.remove_involving([block.id, ElementId::new()]), 1);
        assert!(store.is_empty());
        assert_eq!(store.remove_involving([block.id]), 0);
    }

    #[test]
    fn primitive_repository_marker() {
        let mut store = CorrespondenceStore::new();
        let repo = r(ElementKind::PrimitiveRepository);
        store.set_primitive_repository(repo);
        assert_eq!(store.primitive_repository(), Some(repo));
    }

    #[test]
    fn rebuild_index_restores_queries() {
        let mut store = CorrespondenceStore::new();
        let block = r(ElementKind::Block);
        let comp = r(ElementKind::MethodComponent);
        store.link_one(block, comp).unwrap();
        store.index.clear();
        assert_eq!(store.first_of_kind(block.id, ElementKind::Component), None);
        store.rebuild_index();
        assert_eq!(store.first_of_kind(block.id, ElementKind::Component), Some(comp));
    }

    fn source_kind() -> impl Strategy<Value = ElementKind> {
        prop::sample::select(vec![
            ElementKind::Block,
            ElementKind::Port,
            ElementKind::Property,
        ])
    }

    fn target_kind() -> impl Strategy<Value = ElementKind> {
        prop::sample::select(vec![
            ElementKind::MessageComponent,
            ElementKind::MethodComponent,
            ElementKind::Message,
            ElementKind::Parameter,
            ElementKind::ReturnValue,
            ElementKind::Variable,
            ElementKind::Constant,
        ])
    }

    proptest! {
        #[test]
        fn links_are_symmetric(
            pairs in prop::collection::vec((source_kind(), target_kind()), 1..20)
        ) {
            let mut store = CorrespondenceStore::new();
            let linked: Vec<_> = pairs
                .into_iter()
                .map(|(sk, tk)| {
                    let (a, b) = (r(sk), r(tk));
                    store.link_one(a, b).unwrap();
                    (a, b)
                })
                .collect();

            for (a, b) in &linked {
                prop_assert_eq!(store.first_of_kind(a.id, b.kind), Some(*b));
                prop_assert_eq!(store.first_of_kind(b.id, a.kind), Some(*a));
            }
        }

        #[test]
        fn removal_cascades(
            pairs in prop::collection::vec((source_kind(), target_kind()), 1..20),
            pick in any::<prop::sample::Index>(),
        ) {
            let mut store = CorrespondenceStore::new();
            let linked: Vec<_> = pairs
                .into_iter()
                .map(|(sk, tk)| {
                    let (a, b) = (r(sk), r(tk));
                    store.link_one(a, b).unwrap();
                    (a, b)
                })
                .collect();

            let (a, b) = linked[pick.index(linked.len())];
            store.remove_involving([a.id]);
            prop_assert_eq!(store.first_of_kind(b.id, a.kind), None);
            prop_assert!(store.iter().all(|c| !c.involves(a.id)));
            prop_assert_eq!(store.len(), linked.len() - 1);
        }
    }
}

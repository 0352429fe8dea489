//! The derivation chain: from normalized state to the visible graph.
//!
//! Given a [`PipelineState`], the [`Deriver`] computes everything the layout
//! boundary needs, through a fixed sequence of pure stages:
//!
//! 1. **Membership** — flat modular-pipeline membership index.
//! 2. **Universe** — real nodes/edges plus group pseudo-nodes and boundary
//!    pseudo-edges (`modular`).
//! 3. **Contraction** — contracted groups collapsed to single
//!    representatives (`contract`).
//! 4. **Disabled state** — one boolean per node from the manual/tag/kind/
//!    pipeline/modular causes (`disabled`).
//! 5. **Visible graph** — enabled nodes, surviving edges, and synthesized
//!    transitive bridges, indexed for traversal (`visible`, `transitive`).
//! 6. **Ranks and bands** — layer grouping and batched topological sort
//!    (`rank`).
//!
//! Slicing and linked-node highlighting consume the visible graph
//! independently, triggered by selection.
//!
//! # Memoization
//!
//! Every stage is cached under the identity of its declared inputs (see
//! `memo`): the `Arc` pointer of each state slice or upstream output, plus
//! the values of scalar inputs. Because a state mutator replaces exactly one
//! slice, an interaction invalidates only the stages downstream of what it
//! touched — toggling a tag's hover flag, which no stage declares, can never
//! invalidate anything. Cache hits return the same `Arc`, so repeated
//! derivation over unchanged state is referentially identical.

mod contract;
mod disabled;
mod linked;
mod modular;
mod rank;
mod slice;
mod transitive;
mod visible;
mod working;

pub use disabled::{DisabledCauses, DisabledState};
pub use visible::VisibleGraph;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::domain::{LayerBand, NodeId, PipelineId, SliceSelection};
use crate::error::Result;
use crate::memo::{ArcId, Stage};
use crate::state::PipelineState;

use modular::Membership;
use working::GraphWorkingSet;

/// Everything the layout/render boundary consumes for one derivation pass.
#[derive(Debug, Clone)]
pub struct DerivedGraph {
    /// The visible node/edge set with its traversal index.
    pub visible: Arc<VisibleGraph>,

    /// Visible layer bands in canonical order.
    pub bands: Arc<Vec<LayerBand>>,

    /// Rank per visible node; empty when layering is hidden or absent.
    pub ranks: Arc<BTreeMap<NodeId, usize>>,
}

type MembershipKey = (ArcId, ArcId);
type UniverseKey = (ArcId, ArcId, ArcId, ArcId);
type ContractKey = (ArcId, ArcId, ArcId, ArcId);
type DisabledKey = (ArcId, ArcId, ArcId, ArcId, Option<PipelineId>, ArcId, ArcId, ArcId);
type VisibleKey = (ArcId, ArcId);
type RankKey = (ArcId, ArcId, bool);
type BandsKey = (ArcId, ArcId, bool);
type SliceKey = (ArcId, SliceSelection);
type LinkedKey = (ArcId, Option<NodeId>);

/// Memoized derivation over [`PipelineState`] snapshots.
///
/// A `Deriver` holds one single-slot cache per stage; it is cheap to keep
/// alive for the whole session and re-query after every interaction.
#[derive(Debug, Default)]
pub struct Deriver {
    membership: Stage<MembershipKey, Membership>,
    universe: Stage<UniverseKey, GraphWorkingSet>,
    contracted: Stage<ContractKey, GraphWorkingSet>,
    disabled: Stage<DisabledKey, DisabledState>,
    visible: Stage<VisibleKey, VisibleGraph>,
    ranks: Stage<RankKey, BTreeMap<NodeId, usize>>,
    bands: Stage<BandsKey, Vec<LayerBand>>,
    sliced: Stage<SliceKey, BTreeSet<NodeId>>,
    sliced_deps: Stage<SliceKey, BTreeSet<NodeId>>,
    linked: Stage<LinkedKey, BTreeMap<NodeId, bool>>,
}

impl Deriver {
    /// Create a deriver with cold caches.
    pub fn new() -> Self {
        Self::default()
    }

    fn membership(&mut self, state: &PipelineState) -> Arc<Membership> {
        let key = (ArcId::of(state.nodes_slice()), ArcId::of(state.modular_slice()));
        self.membership.get_or_compute(key, || {
            modular::membership_index(state.nodes(), state.modular_pipelines())
        })
    }

    fn universe(&mut self, state: &PipelineState) -> Arc<GraphWorkingSet> {
        let membership = self.membership(state);
        let key = (
            ArcId::of(state.nodes_slice()),
            ArcId::of(state.edges_slice()),
            ArcId::of(state.modular_slice()),
            ArcId::of(&membership),
        );
        self.universe.get_or_compute(key, || {
            modular::build_universe(
                state.nodes(),
                state.edges(),
                state.modular_pipelines(),
                &membership,
            )
        })
    }

    fn contracted_universe(&mut self, state: &PipelineState) -> Arc<GraphWorkingSet> {
        let universe = self.universe(state);
        let key = (
            ArcId::of(&universe),
            ArcId::of(state.modular_slice()),
            ArcId::of(state.contracted_slice()),
            ArcId::of(state.disabled_modular_slice()),
        );
        self.contracted.get_or_compute(key, || {
            contract::contract_pipelines(
                &universe,
                state.modular_pipelines(),
                state.contracted(),
                state.disabled_modular(),
            )
        })
    }

    /// Disabled state over the contracted universe.
    pub fn disabled_state(&mut self, state: &PipelineState) -> Arc<DisabledState> {
        let ws = self.contracted_universe(state);
        let key = (
            ArcId::of(&ws),
            ArcId::of(state.manual_disabled_slice()),
            ArcId::of(state.enabled_tags_slice()),
            ArcId::of(state.disabled_kinds_slice()),
            state.active_pipeline().cloned(),
            ArcId::of(state.contracted_slice()),
            ArcId::of(state.disabled_modular_slice()),
            ArcId::of(state.layers_slice()),
        );
        self.disabled.get_or_compute(key, || {
            disabled::resolve(
                &ws,
                state.manual_disabled(),
                state.enabled_tags(),
                state.disabled_kinds(),
                state.active_pipeline(),
                state.contracted(),
                state.disabled_modular(),
                state.layers(),
            )
        })
    }

    /// The visible graph: filtered universe plus transitive bridges.
    pub fn visible_graph(&mut self, state: &PipelineState) -> Arc<VisibleGraph> {
        let ws = self.contracted_universe(state);
        let disabled = self.disabled_state(state);
        let key = (ArcId::of(&ws), ArcId::of(&disabled));
        self.visible
            .get_or_compute(key, || VisibleGraph::build(&ws, &disabled))
    }

    /// Rank per visible node.
    ///
    /// # Errors
    ///
    /// [`crate::Error::CyclicDependencies`] when the dependency map has a
    /// cycle; a valid pipeline DAG never triggers this.
    pub fn ranks(&mut self, state: &PipelineState) -> Result<Arc<BTreeMap<NodeId, usize>>> {
        let visible = self.visible_graph(state);
        let key = (
            ArcId::of(&visible),
            ArcId::of(state.layers_slice()),
            state.layers_visible(),
        );
        self.ranks.get_or_try_compute(key, || {
            rank::assign_ranks(&visible, state.layers(), state.layers_visible())
        })
    }

    /// Visible layer bands in canonical order.
    pub fn layer_bands(&mut self, state: &PipelineState) -> Arc<Vec<LayerBand>> {
        let disabled = self.disabled_state(state);
        let key = (
            ArcId::of(&disabled),
            ArcId::of(state.layers_slice()),
            state.layers_visible(),
        );
        self.bands.get_or_compute(key, || {
            rank::layer_bands(disabled.visible_layers(), state.layers(), state.layers_visible())
        })
    }

    /// Run the full derivation pass.
    ///
    /// # Errors
    ///
    /// [`crate::Error::CyclicDependencies`] when rank assignment detects a
    /// cycle in the visible dependency map.
    pub fn derive(&mut self, state: &PipelineState) -> Result<DerivedGraph> {
        let visible = self.visible_graph(state);
        let bands = self.layer_bands(state);
        let ranks = self.ranks(state)?;
        Ok(DerivedGraph { visible, bands, ranks })
    }

    /// The sliced node set for the state's current selection.
    pub fn sliced_nodes(&mut self, state: &PipelineState) -> Arc<BTreeSet<NodeId>> {
        let visible = self.visible_graph(state);
        let key = (ArcId::of(&visible), state.slice().clone());
        self.sliced
            .get_or_compute(key, || slice::sliced_nodes(&visible, state.slice()))
    }

    /// The extra upstream dependency closure of the current slice.
    pub fn sliced_dependencies(&mut self, state: &PipelineState) -> Arc<BTreeSet<NodeId>> {
        let visible = self.visible_graph(state);
        let key = (ArcId::of(&visible), state.slice().clone());
        self.sliced_deps
            .get_or_compute(key, || slice::sliced_dependencies(&visible, state.slice()))
    }

    /// Ancestor/descendant highlighting for the state's focused node.
    pub fn linked_nodes(&mut self, state: &PipelineState) -> Arc<BTreeMap<NodeId, bool>> {
        let visible = self.visible_graph(state);
        let key = (ArcId::of(&visible), state.focused().cloned());
        self.linked
            .get_or_compute(key, || linked::linked_nodes(&visible, state.focused()))
    }
}

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use eframe::egui::{Pos2, Vec2, pos2, vec2};
use serde::Deserialize;

use super::model::{GraphLink, GraphNode};

const INITIAL_RADIUS: f32 = 10.0;

/// Force and cooling constants. Every field may be overridden from a config file.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub charge_strength: f32,
    pub charge_distance_min: f32,
    pub link_distance: f32,
    pub link_weight_factor: f32,
    pub center_strength: f32,
    pub collision_radius: f32,
    pub collision_strength: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub reheat_alpha: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            charge_strength: -400.0,
            charge_distance_min: 1.0,
            link_distance: 180.0,
            link_weight_factor: 0.25,
            center_strength: 0.1,
            collision_radius: 50.0,
            collision_strength: 0.7,
            velocity_decay: 0.4,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            reheat_alpha: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationState {
    pub alpha: f32,
    pub tick_count: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationStatus {
    Idle,
    Running,
    Settled,
}

/// Identifies one `start` of the simulator. Ticks carrying a handle from an
/// earlier start are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickHandle {
    generation: u64,
}

#[derive(Clone, Copy, Debug)]
struct ResolvedLink {
    source: usize,
    target: usize,
    rest_length: f32,
    strength: f32,
    bias: f32,
}

#[derive(Debug)]
pub struct ForceSimulator {
    config: SimulationConfig,
    center: Pos2,
    nodes: Vec<GraphNode>,
    links: Vec<ResolvedLink>,
    index_by_id: HashMap<String, usize>,
    state: SimulationState,
    status: SimulationStatus,
    generation: u64,
}

fn jiggle(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214 + 0.11) * TAU;
    vec2(angle.cos(), angle.sin()) * 1.0e-3
}

impl ForceSimulator {
    pub fn new(config: SimulationConfig, center: Pos2) -> Self {
        Self {
            config,
            center,
            nodes: Vec::new(),
            links: Vec::new(),
            index_by_id: HashMap::new(),
            state: SimulationState {
                alpha: 0.0,
                tick_count: 0,
            },
            status: SimulationStatus::Idle,
            generation: 0,
        }
    }

    pub fn start(&mut self, nodes: Vec<GraphNode>, links: &[GraphLink]) -> TickHandle {
        self.start_seeded(nodes, links, &HashMap::new())
    }

    /// Starts a fresh run. Nodes whose id appears in `seeds` begin at that
    /// position, the rest are laid out on a spiral around the center.
    pub fn start_seeded(
        &mut self,
        mut nodes: Vec<GraphNode>,
        links: &[GraphLink],
        seeds: &HashMap<String, Pos2>,
    ) -> TickHandle {
        let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
        for (index, node) in nodes.iter_mut().enumerate() {
            node.velocity = Vec2::ZERO;
            node.pinned = None;
            node.position = match seeds.get(&node.id) {
                Some(seed) => *seed,
                None => {
                    let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
                    let angle = index as f32 * golden_angle;
                    self.center + vec2(angle.cos(), angle.sin()) * radius
                }
            };
        }

        self.index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        self.links = self.resolve_links(links, nodes.len());
        self.nodes = nodes;
        self.state = SimulationState {
            alpha: 1.0,
            tick_count: 0,
        };
        self.status = SimulationStatus::Running;
        self.generation = self.generation.wrapping_add(1);

        tracing::debug!(
            generation = self.generation,
            nodes = self.nodes.len(),
            links = self.links.len(),
            "simulation started"
        );
        TickHandle {
            generation: self.generation,
        }
    }

    fn resolve_links(&self, links: &[GraphLink], node_count: usize) -> Vec<ResolvedLink> {
        let endpoints = links
            .iter()
            .filter_map(|link| {
                let source = *self.index_by_id.get(&link.source_id)?;
                let target = *self.index_by_id.get(&link.target_id)?;
                (source != target).then_some((source, target, link.weight))
            })
            .collect::<Vec<_>>();

        let mut degree = vec![0usize; node_count];
        for &(source, target, _) in &endpoints {
            degree[source] += 1;
            degree[target] += 1;
        }

        endpoints
            .into_iter()
            .map(|(source, target, weight)| {
                let source_degree = degree[source] as f32;
                let target_degree = degree[target] as f32;
                ResolvedLink {
                    source,
                    target,
                    rest_length: self.config.link_distance
                        / (1.0 + weight.max(0.0) * self.config.link_weight_factor),
                    strength: 1.0 / source_degree.min(target_degree),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect()
    }

    pub fn stop(&mut self, handle: TickHandle) {
        if handle.generation == self.generation && self.status == SimulationStatus::Running {
            self.status = SimulationStatus::Settled;
            tracing::debug!(generation = self.generation, "simulation stopped");
        }
    }

    /// Advances one frame. Returns whether the simulation is still running.
    pub fn tick(&mut self, handle: TickHandle) -> bool {
        if handle.generation != self.generation || self.status != SimulationStatus::Running {
            return false;
        }

        self.state.alpha *= 1.0 - self.config.alpha_decay;
        let alpha = self.state.alpha;

        self.apply_charge(alpha);
        self.apply_links(alpha);
        self.apply_center();
        self.apply_collision();
        self.integrate();

        self.state.tick_count += 1;
        if self.state.alpha < self.config.alpha_min {
            self.status = SimulationStatus::Settled;
            tracing::debug!(
                generation = self.generation,
                ticks = self.state.tick_count,
                "simulation settled"
            );
        }

        self.status == SimulationStatus::Running
    }

    fn apply_charge(&mut self, alpha: f32) {
        let distance_min_sq = self.config.charge_distance_min * self.config.charge_distance_min;
        let strength = self.config.charge_strength * alpha;
        let count = self.nodes.len();

        for i in 0..count {
            for j in (i + 1)..count {
                let mut delta = self.nodes[j].position - self.nodes[i].position;
                if delta == Vec2::ZERO {
                    delta = jiggle(i, j);
                }
                let mut distance_sq = delta.length_sq();
                if distance_sq < distance_min_sq {
                    distance_sq = (distance_min_sq * distance_sq).sqrt();
                }

                let impulse = delta * (strength / distance_sq);
                self.nodes[i].velocity += impulse;
                self.nodes[j].velocity -= impulse;
            }
        }
    }

    fn apply_links(&mut self, alpha: f32) {
        for link in &self.links {
            let source = &self.nodes[link.source];
            let target = &self.nodes[link.target];
            let mut delta =
                (target.position + target.velocity) - (source.position + source.velocity);
            if delta == Vec2::ZERO {
                delta = jiggle(link.source, link.target);
            }

            let length = delta.length();
            let stretch = (length - link.rest_length) / length * alpha * link.strength;
            let correction = delta * stretch;

            self.nodes[link.target].velocity -= correction * link.bias;
            self.nodes[link.source].velocity += correction * (1.0 - link.bias);
        }
    }

    fn apply_center(&mut self) {
        if self.nodes.is_empty() {
            return;
        }

        let mut centroid = Vec2::ZERO;
        for node in &self.nodes {
            centroid += node.position.to_vec2();
        }
        centroid /= self.nodes.len() as f32;

        let shift = (self.center.to_vec2() - centroid) * self.config.center_strength;
        for node in self.nodes.iter_mut().filter(|node| node.pinned.is_none()) {
            node.position += shift;
        }
    }

    fn apply_collision(&mut self) {
        let radius = self.config.collision_radius;
        let min_distance = radius * 2.0;
        let min_distance_sq = min_distance * min_distance;
        let count = self.nodes.len();

        for i in 0..count {
            for j in (i + 1)..count {
                let a = &self.nodes[i];
                let b = &self.nodes[j];
                let mut delta = (a.position + a.velocity) - (b.position + b.velocity);
                let distance_sq = delta.length_sq();
                if distance_sq >= min_distance_sq {
                    continue;
                }
                if delta == Vec2::ZERO {
                    delta = jiggle(i, j);
                }

                let distance = delta.length();
                let push = delta
                    * ((min_distance - distance) / distance * self.config.collision_strength);
                // Equal radii split the push evenly.
                self.nodes[i].velocity += push * 0.5;
                self.nodes[j].velocity -= push * 0.5;
            }
        }
    }

    fn integrate(&mut self) {
        let retain = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            if let Some(pin) = node.pinned {
                node.position = pin;
                node.velocity = Vec2::ZERO;
            } else {
                node.velocity *= retain;
                node.position += node.velocity;
            }
        }
    }

    /// Fixes a node at `point` and reheats the simulation. Returns false when
    /// no node has that id.
    pub fn pin(&mut self, id: &str, point: Pos2) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        self.nodes[index].pinned = Some(point);
        self.reheat();
        true
    }

    /// Releases a pinned node and reheats the simulation.
    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        self.nodes[index].pinned = None;
        self.reheat();
        true
    }

    fn reheat(&mut self) {
        if self.status == SimulationStatus::Idle {
            return;
        }
        self.state.alpha = self.state.alpha.max(self.config.reheat_alpha);
        if self.status == SimulationStatus::Settled {
            tracing::trace!(generation = self.generation, "simulation reheated");
        }
        self.status = SimulationStatus::Running;
    }

    pub fn set_center(&mut self, center: Pos2) {
        self.center = center;
    }

    pub fn center(&self) -> Pos2 {
        self.center
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn positions(&self) -> HashMap<String, Pos2> {
        self.nodes
            .iter()
            .map(|node| (node.id.clone(), node.position))
            .collect()
    }
}

impl Default for ForceSimulator {
    fn default() -> Self {
        Self::new(SimulationConfig::default(), pos2(0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::ContactRecord;

    fn nodes(count: usize) -> Vec<GraphNode> {
        (0..count)
            .map(|index| {
                GraphNode::from_record(
                    &ContactRecord::new(format!("n{index}"), "x").with_strength(50),
                )
            })
            .collect()
    }

    fn chain_links(count: usize) -> Vec<GraphLink> {
        (1..count)
            .map(|index| GraphLink::new(format!("n{}", index - 1), format!("n{index}"), 2.0))
            .collect()
    }

    fn running(count: usize) -> (ForceSimulator, TickHandle) {
        let mut simulator = ForceSimulator::new(SimulationConfig::default(), pos2(400.0, 300.0));
        let handle = simulator.start(nodes(count), &chain_links(count));
        (simulator, handle)
    }

    #[test]
    fn starts_running_at_full_energy() {
        let (simulator, _) = running(4);
        assert_eq!(simulator.status(), SimulationStatus::Running);
        assert_eq!(simulator.state().alpha, 1.0);
        assert_eq!(simulator.state().tick_count, 0);
    }

    #[test]
    fn alpha_decays_monotonically_until_settled() {
        let (mut simulator, handle) = running(8);
        let mut previous = simulator.state().alpha;
        let mut ticks = 0;
        while simulator.tick(handle) {
            let alpha = simulator.state().alpha;
            assert!(alpha <= previous);
            previous = alpha;
            ticks += 1;
            assert!(ticks < 1_000, "simulation never settled");
        }

        assert_eq!(simulator.status(), SimulationStatus::Settled);
        assert!(simulator.state().alpha < SimulationConfig::default().alpha_min);
        assert!(!simulator.tick(handle));
    }

    #[test]
    fn pinned_node_sits_exactly_on_its_pin() {
        let (mut simulator, handle) = running(6);
        let pin = pos2(123.5, -42.25);
        assert!(simulator.pin("n2", pin));

        for _ in 0..25 {
            simulator.tick(handle);
            assert_eq!(simulator.node("n2").map(|node| node.position), Some(pin));
        }
    }

    #[test]
    fn pin_on_settled_simulation_reheats() {
        let (mut simulator, handle) = running(3);
        while simulator.tick(handle) {}
        assert_eq!(simulator.status(), SimulationStatus::Settled);

        assert!(simulator.pin("n0", pos2(10.0, 10.0)));
        assert_eq!(simulator.status(), SimulationStatus::Running);
        assert_eq!(simulator.state().alpha, SimulationConfig::default().reheat_alpha);
        assert!(simulator.tick(handle));

        assert!(simulator.unpin("n0"));
        assert_eq!(simulator.node("n0").and_then(|node| node.pinned), None);
    }

    #[test]
    fn pin_unknown_node_is_rejected() {
        let (mut simulator, _) = running(2);
        assert!(!simulator.pin("missing", Pos2::ZERO));
        assert!(!simulator.unpin("missing"));
    }

    #[test]
    fn stale_handle_does_not_move_nodes() {
        let (mut simulator, stale) = running(5);
        let fresh = simulator.start(nodes(5), &chain_links(5));
        let before = simulator.positions();

        assert!(!simulator.tick(stale));
        assert_eq!(simulator.positions(), before);
        assert!(simulator.tick(fresh));
    }

    #[test]
    fn stop_halts_ticking() {
        let (mut simulator, handle) = running(5);
        simulator.stop(handle);
        let before = simulator.positions();

        assert_eq!(simulator.status(), SimulationStatus::Settled);
        assert!(!simulator.tick(handle));
        assert_eq!(simulator.positions(), before);
    }

    fn settle_pair(config: SimulationConfig, gap: f32) -> f32 {
        let mut simulator = ForceSimulator::new(config, pos2(400.0, 300.0));
        let seeds = HashMap::from([
            ("n0".to_owned(), pos2(400.0 - gap / 2.0, 300.0)),
            ("n1".to_owned(), pos2(400.0 + gap / 2.0, 300.0)),
        ]);
        let handle = simulator.start_seeded(nodes(2), &[], &seeds);
        let mut ticks = 0;
        while simulator.tick(handle) {
            ticks += 1;
            assert!(ticks < 1_000, "simulation never settled");
        }
        simulator.nodes()[0].position.distance(simulator.nodes()[1].position)
    }

    #[test]
    fn collision_keeps_nodes_a_diameter_apart() {
        let config = SimulationConfig {
            charge_strength: 0.0,
            ..SimulationConfig::default()
        };
        let diameter = 2.0 * config.collision_radius;

        let separated = settle_pair(config, 10.0);
        assert!(separated >= diameter - 1.0, "settled at {separated}");

        let without_collision = settle_pair(
            SimulationConfig {
                collision_strength: 0.0,
                ..config
            },
            10.0,
        );
        assert!(without_collision < diameter - 1.0);
        assert!(without_collision < separated);
    }

    #[test]
    fn charge_separates_spiral_neighbours() {
        let (mut simulator, handle) = running(2);
        let start = simulator.nodes()[0].position.distance(simulator.nodes()[1].position);
        for _ in 0..60 {
            simulator.tick(handle);
        }
        let end = simulator.nodes()[0].position.distance(simulator.nodes()[1].position);
        assert!(end > start);
        assert!(end.is_finite());
    }

    #[test]
    fn centroid_drifts_toward_center() {
        let mut simulator = ForceSimulator::new(SimulationConfig::default(), pos2(400.0, 300.0));
        let seeds = (0..4)
            .map(|index| (format!("n{index}"), pos2(1_000.0 + index as f32 * 120.0, 900.0)))
            .collect::<HashMap<_, _>>();
        let handle = simulator.start_seeded(nodes(4), &[], &seeds);

        for _ in 0..100 {
            simulator.tick(handle);
        }
        let centroid = simulator
            .nodes()
            .iter()
            .fold(Vec2::ZERO, |sum, node| sum + node.position.to_vec2())
            / 4.0;
        assert!((centroid - vec2(400.0, 300.0)).length() < 50.0);
    }

    #[test]
    fn seeds_override_spiral_placement() {
        let mut simulator = ForceSimulator::default();
        let seeds = HashMap::from([("n1".to_owned(), pos2(77.0, 88.0))]);
        simulator.start_seeded(nodes(3), &[], &seeds);
        assert_eq!(simulator.node("n1").map(|node| node.position), Some(pos2(77.0, 88.0)));
        assert_ne!(simulator.node("n0").map(|node| node.position), Some(pos2(77.0, 88.0)));
    }
}

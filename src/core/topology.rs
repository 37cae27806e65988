//! Hardware connectivity graphs and logical/physical qubit layouts (§4.8),
//! used by the router to judge which gates are directly executable.

use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CouplingMap {
    edges: HashSet<(usize, usize)>,
    adjacency: HashMap<usize, HashSet<usize>>,
    num_qubits: usize,
}

impl CouplingMap {
    pub fn new(edge_list: &[(usize, usize)], bidirectional: bool) -> Self {
        let mut edges = HashSet::new();
        let mut adjacency: HashMap<usize, HashSet<usize>> = HashMap::new();

        for &(q1, q2) in edge_list {
            edges.insert((q1, q2));
            if bidirectional {
                edges.insert((q2, q1));
            }
            adjacency.entry(q1).or_default();
            adjacency.entry(q2).or_default();
            adjacency.get_mut(&q1).unwrap().insert(q2);
            if bidirectional {
                adjacency.get_mut(&q2).unwrap().insert(q1);
            }
        }

        let num_qubits = edge_list.iter().flat_map(|&(a, b)| [a, b]).max().map(|m| m + 1).unwrap_or(0);

        CouplingMap { edges, adjacency, num_qubits }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn is_connected(&self, q1: usize, q2: usize) -> bool {
        self.edges.contains(&(q1, q2))
    }

    pub fn neighbors(&self, qubit: usize) -> HashSet<usize> {
        self.adjacency.get(&qubit).cloned().unwrap_or_default()
    }

    pub fn distance(&self, q1: usize, q2: usize) -> Option<usize> {
        if q1 == q2 {
            return Some(0);
        }
        let mut visited = HashSet::from([q1]);
        let mut queue = VecDeque::from([(q1, 0usize)]);

        while let Some((current, dist)) = queue.pop_front() {
            for neighbor in self.neighbors(current) {
                if neighbor == q2 {
                    return Some(dist + 1);
                }
                if visited.insert(neighbor) {
                    queue.push_back((neighbor, dist + 1));
                }
            }
        }
        None
    }

    pub fn shortest_path(&self, q1: usize, q2: usize) -> Vec<usize> {
        if q1 == q2 {
            return vec![q1];
        }
        let mut visited = HashSet::from([q1]);
        let mut queue = VecDeque::from([(q1, vec![q1])]);

        while let Some((current, path)) = queue.pop_front() {
            for neighbor in self.neighbors(current) {
                if neighbor == q2 {
                    let mut full = path.clone();
                    full.push(neighbor);
                    return full;
                }
                if visited.insert(neighbor) {
                    let mut extended = path.clone();
                    extended.push(neighbor);
                    queue.push_back((neighbor, extended));
                }
            }
        }
        Vec::new()
    }
}

/// Predefined hardware backend topologies (§4.8, §6).
pub struct HardwareTopology;

impl HardwareTopology {
    pub fn linear(n: usize) -> CouplingMap {
        let edges: Vec<(usize, usize)> = (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        CouplingMap::new(&edges, true)
    }

    pub fn ring(n: usize) -> CouplingMap {
        let edges: Vec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        CouplingMap::new(&edges, true)
    }

    pub fn grid(rows: usize, cols: usize) -> CouplingMap {
        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let idx = r * cols + c;
                if c < cols - 1 {
                    edges.push((idx, idx + 1));
                }
                if r < rows - 1 {
                    edges.push((idx, idx + cols));
                }
            }
        }
        CouplingMap::new(&edges, true)
    }

    /// A simplified 27-qubit slice of IBM's heavy-hex lattice.
    pub fn heavy_hex() -> CouplingMap {
        let edges: &[(usize, usize)] = &[
            (0, 1), (1, 2), (2, 3), (3, 4),
            (0, 5), (4, 9),
            (5, 6), (6, 7), (7, 8), (8, 9),
            (6, 11), (8, 13),
            (10, 11), (11, 12), (12, 13), (13, 14),
            (10, 15), (14, 19),
            (15, 16), (16, 17), (17, 18), (18, 19),
            (16, 21), (18, 23),
            (20, 21), (21, 22), (22, 23), (23, 24),
            (20, 25), (24, 26),
        ];
        CouplingMap::new(edges, true)
    }

    /// A 5×27 grid approximation of IBM's 127-qubit Brisbane backend.
    pub fn ibm_brisbane() -> CouplingMap {
        Self::grid(5, 27)
    }

    /// IonQ Aria: a 25-qubit trapped-ion device, all-to-all connected.
    pub fn ionq_aria() -> CouplingMap {
        let n = 25;
        let edges: Vec<(usize, usize)> = (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j))).collect();
        CouplingMap::new(&edges, true)
    }

    /// An 8×10 grid approximation of Rigetti's 80-qubit Aspen lattice.
    pub fn rigetti_aspen() -> CouplingMap {
        Self::grid(8, 10)
    }

    pub fn all_to_all(n: usize) -> CouplingMap {
        let edges: Vec<(usize, usize)> = (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j))).collect();
        CouplingMap::new(&edges, true)
    }

    /// Resolves a preset name from §6's backend catalogue, case-insensitively.
    pub fn by_name(name: &str, fallback_qubits: usize) -> Option<CouplingMap> {
        match name.to_lowercase().as_str() {
            "linear" => Some(Self::linear(fallback_qubits)),
            "ring" => Some(Self::ring(fallback_qubits)),
            "heavy_hex" | "heavyhex" => Some(Self::heavy_hex()),
            "ibm_brisbane" => Some(Self::ibm_brisbane()),
            "ionq_aria" => Some(Self::ionq_aria()),
            "rigetti_aspen" => Some(Self::rigetti_aspen()),
            "all_to_all" | "alltoall" => Some(Self::all_to_all(fallback_qubits)),
            _ => None,
        }
    }
}

/// A bijective mapping between logical (circuit) qubits and physical
/// (device) qubits, mutated in place as the router inserts SWAPs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    logical_to_physical: HashMap<usize, usize>,
    physical_to_logical: HashMap<usize, usize>,
}

impl Layout {
    pub fn new(initial_mapping: HashMap<usize, usize>) -> Self {
        let physical_to_logical = initial_mapping.iter().map(|(&l, &p)| (p, l)).collect();
        Layout { logical_to_physical: initial_mapping, physical_to_logical }
    }

    pub fn identity(num_qubits: usize) -> Self {
        Self::new((0..num_qubits).map(|q| (q, q)).collect())
    }

    pub fn set_mapping(&mut self, logical: usize, physical: usize) {
        if let Some(old_physical) = self.logical_to_physical.remove(&logical) {
            self.physical_to_logical.remove(&old_physical);
        }
        if let Some(old_logical) = self.physical_to_logical.remove(&physical) {
            self.logical_to_physical.remove(&old_logical);
        }
        self.logical_to_physical.insert(logical, physical);
        self.physical_to_logical.insert(physical, logical);
    }

    /// Swaps whatever logical qubits currently sit at two physical
    /// positions, in place, without requiring either to be mapped.
    pub fn swap(&mut self, physical1: usize, physical2: usize) {
        let l1 = self.physical_to_logical.get(&physical1).copied();
        let l2 = self.physical_to_logical.get(&physical2).copied();

        match l1 {
            Some(l) => {
                self.logical_to_physical.insert(l, physical2);
                self.physical_to_logical.insert(physical2, l);
            }
            None => {
                self.physical_to_logical.remove(&physical2);
            }
        }

        match l2 {
            Some(l) => {
                self.logical_to_physical.insert(l, physical1);
                self.physical_to_logical.insert(physical1, l);
            }
            None => {
                self.physical_to_logical.remove(&physical1);
            }
        }
    }

    pub fn get_physical(&self, logical: usize) -> usize {
        self.logical_to_physical.get(&logical).copied().unwrap_or(logical)
    }

    pub fn get_logical(&self, physical: usize) -> usize {
        self.physical_to_logical.get(&physical).copied().unwrap_or(physical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_topology_has_expected_neighbor_counts() {
        let map = HardwareTopology::linear(4);
        assert_eq!(map.neighbors(0).len(), 1);
        assert_eq!(map.neighbors(1).len(), 2);
    }

    #[test]
    fn distance_over_a_ring_wraps_around() {
        let map = HardwareTopology::ring(4);
        assert_eq!(map.distance(0, 2), Some(2));
    }

    #[test]
    fn shortest_path_ends_at_the_destination() {
        let map = HardwareTopology::linear(5);
        let path = map.shortest_path(0, 4);
        assert_eq!(path, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn layout_swap_exchanges_logical_qubits_between_physical_sites() {
        let mut layout = Layout::identity(3);
        layout.swap(0, 1);
        assert_eq!(layout.get_logical(0), 1);
        assert_eq!(layout.get_logical(1), 0);
        assert_eq!(layout.get_physical(0), 1);
        assert_eq!(layout.get_physical(1), 0);
    }

    #[test]
    fn all_to_all_topology_connects_every_pair() {
        let map = HardwareTopology::all_to_all(5);
        assert!(map.is_connected(0, 4));
        assert_eq!(map.distance(0, 4), Some(1));
    }

    #[test]
    fn layout_stays_bijective_after_a_sequence_of_swaps() {
        let mut layout = Layout::identity(5);
        for &(p1, p2) in &[(0, 1), (2, 3), (1, 4), (0, 3), (2, 1)] {
            layout.swap(p1, p2);
            for physical in 0..5 {
                let logical = layout.get_logical(physical);
                assert_eq!(layout.get_physical(logical), physical);
            }
        }
    }
}

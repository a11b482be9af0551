use super::interval_pair::IntervalPair;

/// Undirected graph over the interval pairs of one classification bucket
///
/// Nodes are referred to by their index in `nodes`. Two nodes share an edge if their clustering
/// distance is within the clustering radius.
///
pub struct ProximityGraph {
    pub nodes: Vec<IntervalPair>,

    /// Sorted neighbor indexes of each node
    adjacency: Vec<Vec<usize>>,
}

impl ProximityGraph {
    /// Build the graph, connecting every pair of nodes within distance `radius`
    ///
    /// Because the clustering distance is the mean of the start and end center distances, two
    /// nodes can only be within `radius` of each other if their start centers are within
    /// `2 * radius`. Nodes are scanned in start center order so that only this window is tested,
    /// which produces the same edge set as an all-pairs comparison.
    ///
    pub fn new(nodes: Vec<IntervalPair>, radius: f64) -> Self {
        assert!(radius >= 0.0);
        let node_count = nodes.len();
        let mut adjacency = vec![Vec::new(); node_count];

        let mut order = (0..node_count).collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            nodes[a]
                .start
                .center()
                .partial_cmp(&nodes[b].start.center())
                .unwrap()
                .then(a.cmp(&b))
        });

        let max_start_center_dist = 2.0 * radius;
        for (order_index, &node_index) in order.iter().enumerate() {
            let node = &nodes[node_index];
            for &other_index in order[(order_index + 1)..].iter() {
                let other = &nodes[other_index];
                if other.start.center() - node.start.center() > max_start_center_dist {
                    break;
                }
                if node.dist(other) <= radius {
                    adjacency[node_index].push(other_index);
                    adjacency[other_index].push(node_index);
                }
            }
        }

        for neighbors in adjacency.iter_mut() {
            neighbors.sort_unstable();
        }

        Self { nodes, adjacency }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|x| x.len()).sum::<usize>() / 2
    }

    pub fn neighbors(&self, node_index: usize) -> &[usize] {
        &self.adjacency[node_index]
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].binary_search(&b).is_ok()
    }

    /// True if every pair of the given nodes shares an edge
    ///
    pub fn is_complete(&self, node_indexes: &[usize]) -> bool {
        for (i, &a) in node_indexes.iter().enumerate() {
            for &b in node_indexes[(i + 1)..].iter() {
                if !self.has_edge(a, b) {
                    return false;
                }
            }
        }
        true
    }

    /// Connected components of the graph
    ///
    /// Each component is a sorted list of node indexes, and components are returned in order of
    /// their lowest node index. Isolated nodes form their own component.
    ///
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let node_count = self.node_count();
        let mut visited = vec![false; node_count];
        let mut components = Vec::new();
        for root in 0..node_count {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            let mut component = vec![root];
            let mut stack = vec![root];
            while let Some(node_index) = stack.pop() {
                for &neighbor in self.neighbors(node_index) {
                    if !visited[neighbor] {
                        visited[neighbor] = true;
                        component.push(neighbor);
                        stack.push(neighbor);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }
}

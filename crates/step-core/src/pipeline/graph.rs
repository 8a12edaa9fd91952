//! Grafo de dependencias entre tareas.
//!
//! Se construye a partir de (tarea, upstream) y valida que sea un DAG. El
//! orden topológico usa Kahn con desempate por orden de declaración, así que
//! dos construcciones del mismo pipeline dan exactamente el mismo orden. Las
//! "waves" agrupan tareas cuyas dependencias están todas en waves anteriores:
//! dentro de una wave las tareas son elegibles para ejecución concurrente.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::errors::DefinitionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: Vec<String>,         // orden de declaración
    upstream: Vec<Vec<usize>>,  // por nodo: índices de dependencias, ordenados y sin duplicados
    downstream: Vec<Vec<usize>>,
    topo: Vec<usize>,
    waves: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Construye el grafo. `nodes` en orden de declaración, cada uno con los ids
    /// de los que depende. Ids desconocidos y ciclos son error.
    pub fn new<I, S, U>(nodes: I) -> Result<Self, DefinitionError>
        where I: IntoIterator<Item = (S, Vec<U>)>,
              S: Into<String>,
              U: AsRef<str>
    {
        let raw: Vec<(String, Vec<U>)> = nodes.into_iter().map(|(n, deps)| (n.into(), deps)).collect();
        let index: HashMap<&str, usize> = raw.iter().enumerate().map(|(i, (n, _))| (n.as_str(), i)).collect();

        let mut upstream = vec![Vec::new(); raw.len()];
        let mut downstream = vec![Vec::new(); raw.len()];
        for (i, (name, deps)) in raw.iter().enumerate() {
            let mut ups: BTreeSet<usize> = BTreeSet::new();
            for d in deps {
                let d = d.as_ref();
                let j = *index.get(d).ok_or_else(|| DefinitionError::UnknownTask { referrer: name.clone(),
                                                                                  task: d.to_string() })?;
                ups.insert(j);
            }
            for &j in &ups {
                downstream[j].push(i);
            }
            upstream[i] = ups.into_iter().collect();
        }
        let nodes: Vec<String> = raw.into_iter().map(|(n, _)| n).collect();

        let topo = kahn(&upstream, &downstream).map_err(|remaining| DefinitionError::Cycle { path: cycle_path(&nodes, &upstream, &remaining) })?;

        let mut level = vec![0usize; nodes.len()];
        for &i in &topo {
            level[i] = upstream[i].iter().map(|&j| level[j] + 1).max().unwrap_or(0);
        }
        let depth = level.iter().copied().max().map(|m| m + 1).unwrap_or(0);
        let mut waves: Vec<Vec<usize>> = vec![Vec::new(); depth];
        for (i, &l) in level.iter().enumerate() {
            waves[l].push(i);
        }

        Ok(Self { nodes,
                  upstream,
                  downstream,
                  topo,
                  waves })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids en orden de declaración.
    pub fn nodes(&self) -> Vec<&str> {
        self.nodes.iter().map(String::as_str).collect()
    }

    pub fn contains(&self, task: &str) -> bool {
        self.position(task).is_some()
    }

    fn position(&self, task: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n == task)
    }

    fn names(&self, idx: &[usize]) -> Vec<&str> {
        idx.iter().map(|&i| self.nodes[i].as_str()).collect()
    }

    /// Aristas `(upstream, downstream)` sin duplicados, ordenadas por
    /// declaración del downstream y luego del upstream.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.upstream
            .iter()
            .enumerate()
            .flat_map(|(i, ups)| ups.iter().map(move |&j| (self.nodes[j].as_str(), self.nodes[i].as_str())))
            .collect()
    }

    pub fn dependencies_of(&self, task: &str) -> Vec<&str> {
        self.position(task).map(|i| self.names(&self.upstream[i])).unwrap_or_default()
    }

    pub fn dependents_of(&self, task: &str) -> Vec<&str> {
        self.position(task).map(|i| self.names(&self.downstream[i])).unwrap_or_default()
    }

    /// Tareas sin dependientes.
    pub fn terminals(&self) -> Vec<&str> {
        (0..self.nodes.len()).filter(|&i| self.downstream[i].is_empty())
                             .map(|i| self.nodes[i].as_str())
                             .collect()
    }

    pub fn topological_order(&self) -> Vec<&str> {
        self.names(&self.topo)
    }

    pub fn waves(&self) -> Vec<Vec<&str>> {
        self.waves.iter().map(|w| self.names(w)).collect()
    }

    /// `true` si el grafo es una única cadena lineal.
    pub fn is_chain(&self) -> bool {
        self.waves.iter().all(|w| w.len() == 1) && self.edges().len() + 1 == self.nodes.len().max(1)
    }
}

/// Kahn. `Err` devuelve los nodos que quedaron sin procesar (parte de un ciclo
/// o aguas abajo de uno).
fn kahn(upstream: &[Vec<usize>], downstream: &[Vec<usize>]) -> Result<Vec<usize>, Vec<usize>> {
    let mut indegree: Vec<usize> = upstream.iter().map(Vec::len).collect();
    let mut ready: BTreeSet<usize> = (0..upstream.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(upstream.len());
    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &d in &downstream[i] {
            indegree[d] -= 1;
            if indegree[d] == 0 {
                ready.insert(d);
            }
        }
    }
    if order.len() == upstream.len() {
        Ok(order)
    } else {
        let done: HashSet<usize> = order.into_iter().collect();
        Err((0..upstream.len()).filter(|i| !done.contains(i)).collect())
    }
}

/// Recorre dependencias dentro del conjunto remanente hasta repetir un nodo.
/// Cada nodo remanente tiene al menos una dependencia remanente, así que el
/// recorrido siempre cierra. El camino se devuelve en sentido upstream -> downstream.
fn cycle_path(nodes: &[String], upstream: &[Vec<usize>], remaining: &[usize]) -> Vec<String> {
    let rem: HashSet<usize> = remaining.iter().copied().collect();
    let mut walk: Vec<usize> = Vec::new();
    let mut current = match remaining.first() {
        Some(&c) => c,
        None => return Vec::new(),
    };
    loop {
        if let Some(pos) = walk.iter().position(|&n| n == current) {
            let mut cycle: Vec<usize> = walk[pos..].to_vec();
            cycle.push(current);
            cycle.reverse();
            return cycle.into_iter().map(|i| nodes[i].clone()).collect();
        }
        walk.push(current);
        match upstream[current].iter().find(|j| rem.contains(j)) {
            Some(&next) => current = next,
            None => return walk.into_iter().map(|i| nodes[i].clone()).collect(),
        }
    }
}

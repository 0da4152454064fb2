//! Task DAG with forward and backward critical-path passes

use std::collections::{HashMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ScheduleError;
use crate::model::{Dependency, Task};

/// Per-task CPM values, fresh for every pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    pub task_id: String,
    pub title: String,
    pub duration: i64,
    pub early_start: i64,
    pub early_finish: i64,
    pub late_start: i64,
    pub late_finish: i64,
    pub slack: i64,
    pub is_critical: bool,
    pub progress: f64,
    pub dependencies: Vec<String>,
    pub scheduled_start: NaiveDate,
    pub scheduled_finish: NaiveDate,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

/// Adjacency over task indices. Edges point from dependency to dependent.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
    skipped: Vec<Dependency>,
}

impl TaskGraph {
    pub fn build(tasks: &[Task], dependencies: &[Dependency]) -> Result<Self, ScheduleError> {
        let mut index = HashMap::with_capacity(tasks.len());
        let mut ids = Vec::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            if index.insert(task.id.clone(), i).is_some() {
                return Err(ScheduleError::DuplicateTask(task.id.clone()));
            }
            ids.push(task.id.clone());
        }

        let mut preds = vec![Vec::new(); tasks.len()];
        let mut succs = vec![Vec::new(); tasks.len()];
        let mut seen = HashSet::new();
        let mut skipped = Vec::new();

        for dep in dependencies {
            let (Some(&to), Some(&from)) = (index.get(&dep.task_id), index.get(&dep.depends_on))
            else {
                warn!(
                    "Skipping dependency {} -> {}: unknown task",
                    dep.depends_on, dep.task_id
                );
                skipped.push(dep.clone());
                continue;
            };
            if seen.insert((from, to)) {
                preds[to].push(from);
                succs[from].push(to);
            }
        }

        Ok(Self {
            ids,
            index,
            preds,
            succs,
            skipped,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, idx: usize) -> &str {
        &self.ids[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn predecessors(&self, idx: usize) -> &[usize] {
        &self.preds[idx]
    }

    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.succs[idx]
    }

    pub fn edge_count(&self) -> usize {
        self.preds.iter().map(Vec::len).sum()
    }

    /// Dependencies dropped because they referenced unknown tasks
    pub fn skipped(&self) -> &[Dependency] {
        &self.skipped
    }

    /// Depth-first post-order over predecessors, so every task follows all of
    /// its dependencies. Runs on an explicit stack; re-entering a node that is
    /// still being visited is a cycle.
    pub fn topological_order(&self) -> Result<Vec<usize>, ScheduleError> {
        let mut marks = vec![Mark::Unvisited; self.len()];
        let mut order = Vec::with_capacity(self.len());

        for root in 0..self.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::Visiting;
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

            while let Some(top) = stack.last_mut() {
                let (node, next) = *top;
                if next < self.preds[node].len() {
                    top.1 += 1;
                    let pred = self.preds[node][next];
                    match marks[pred] {
                        Mark::Visiting => {
                            return Err(ScheduleError::CircularDependency {
                                task_id: self.ids[pred].clone(),
                            });
                        }
                        Mark::Unvisited => {
                            marks[pred] = Mark::Visiting;
                            stack.push((pred, 0));
                        }
                        Mark::Visited => {}
                    }
                } else {
                    stack.pop();
                    marks[node] = Mark::Visited;
                    order.push(node);
                }
            }
        }

        Ok(order)
    }
}

/// Run both CPM passes. `durations` is indexed like the task slice the graph
/// was built from.
pub fn critical_path_pass(
    graph: &TaskGraph,
    tasks: &[Task],
    durations: &[i64],
    project_start: NaiveDate,
) -> Result<Vec<TaskNode>, ScheduleError> {
    let order = graph.topological_order()?;
    let n = graph.len();

    let mut early_start = vec![0i64; n];
    let mut early_finish = vec![0i64; n];

    for &idx in &order {
        let preds = graph.predecessors(idx);
        let es = if preds.is_empty() {
            tasks[idx]
                .start_date
                .map(|d| (d - project_start).num_days().max(0))
                .unwrap_or(0)
        } else {
            preds.iter().map(|&p| early_finish[p]).max().unwrap_or(0)
        };
        early_start[idx] = es;
        early_finish[idx] = es + durations[idx];
    }

    let project_end = early_finish.iter().copied().max().unwrap_or(0);

    let mut late_start = vec![0i64; n];
    let mut late_finish = vec![0i64; n];

    for &idx in order.iter().rev() {
        let succs = graph.successors(idx);
        let lf = if succs.is_empty() {
            early_finish[idx].max(project_end)
        } else {
            succs.iter().map(|&s| late_start[s]).min().unwrap_or(project_end)
        };
        late_finish[idx] = lf;
        late_start[idx] = lf - durations[idx];
    }

    debug!(
        "CPM pass over {} tasks, {} edges, project end day {}",
        n,
        graph.edge_count(),
        project_end
    );

    let day = |offset: i64, task: &Task| {
        project_start
            .checked_add_days(Days::new(offset.max(0) as u64))
            .ok_or_else(|| ScheduleError::BeyondCalendar {
                task_id: task.id.clone(),
            })
    };

    let nodes = order
        .iter()
        .map(|&idx| -> Result<TaskNode, ScheduleError> {
            let task = &tasks[idx];
            let slack = late_start[idx] - early_start[idx];
            Ok(TaskNode {
                task_id: task.id.clone(),
                title: task.title.clone(),
                duration: durations[idx],
                early_start: early_start[idx],
                early_finish: early_finish[idx],
                late_start: late_start[idx],
                late_finish: late_finish[idx],
                slack,
                is_critical: slack == 0,
                progress: task.effective_progress(),
                dependencies: graph
                    .predecessors(idx)
                    .iter()
                    .map(|&p| graph.id(p).to_string())
                    .collect(),
                scheduled_start: day(early_start[idx], task)?,
                scheduled_finish: day(early_finish[idx], task)?,
            })
        })
        .collect::<Result<Vec<_>, ScheduleError>>()?;

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn tasks(spec: &[(&str, f64)]) -> Vec<Task> {
        spec.iter()
            .map(|(id, days)| Task::new(*id, id.to_uppercase()).with_days(*days))
            .collect()
    }

    fn run(tasks: &[Task], deps: &[Dependency]) -> Result<Vec<TaskNode>, ScheduleError> {
        let graph = TaskGraph::build(tasks, deps)?;
        let durations: Vec<i64> = tasks.iter().map(|t| t.duration_days(8.0)).collect();
        critical_path_pass(&graph, tasks, &durations, start())
    }

    #[test]
    fn test_forward_pass_invariants() {
        let tasks = tasks(&[("a", 2.0), ("b", 3.0), ("c", 4.0), ("d", 1.0)]);
        let deps = vec![
            Dependency::new("c", "a"),
            Dependency::new("c", "b"),
            Dependency::new("d", "c"),
        ];
        let nodes = run(&tasks, &deps).unwrap();
        let by_id: HashMap<_, _> = nodes.iter().map(|n| (n.task_id.as_str(), n)).collect();

        for node in &nodes {
            assert_eq!(node.early_finish, node.early_start + node.duration);
            for dep in &node.dependencies {
                assert!(node.early_start >= by_id[dep.as_str()].early_finish);
            }
            assert!(node.slack >= 0);
            assert_eq!(node.is_critical, node.slack == 0);
        }
    }

    #[test]
    fn test_order_respects_dependencies() {
        let tasks = tasks(&[("c", 1.0), ("b", 1.0), ("a", 1.0)]);
        let deps = vec![Dependency::new("c", "b"), Dependency::new("b", "a")];
        let graph = TaskGraph::build(&tasks, &deps).unwrap();
        let order: Vec<&str> = graph
            .topological_order()
            .unwrap()
            .into_iter()
            .map(|i| graph.id(i))
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_two_node_cycle_detected() {
        let tasks = tasks(&[("a", 1.0), ("b", 1.0)]);
        let deps = vec![Dependency::new("a", "b"), Dependency::new("b", "a")];
        let err = run(&tasks, &deps).unwrap_err();
        assert!(matches!(err, ScheduleError::CircularDependency { .. }));
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let tasks = tasks(&[("a", 1.0)]);
        let deps = vec![Dependency::new("a", "a")];
        assert_eq!(
            run(&tasks, &deps).unwrap_err(),
            ScheduleError::CircularDependency {
                task_id: "a".to_string()
            }
        );
    }

    #[test]
    fn test_long_chain_no_stack_overflow() {
        let tasks: Vec<Task> = (0..20_000)
            .map(|i| Task::new(format!("t{}", i), "step").with_days(1.0))
            .collect();
        let deps: Vec<Dependency> = (1..20_000)
            .map(|i| Dependency::new(format!("t{}", i), format!("t{}", i - 1)))
            .collect();
        let nodes = run(&tasks, &deps).unwrap();
        assert_eq!(nodes.last().unwrap().early_finish, 20_000);
    }

    #[test]
    fn test_unknown_dependency_skipped() {
        let tasks = tasks(&[("a", 1.0)]);
        let deps = vec![Dependency::new("a", "ghost")];
        let graph = TaskGraph::build(&tasks, &deps).unwrap();
        assert_eq!(graph.skipped().len(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let tasks = tasks(&[("a", 1.0), ("a", 2.0)]);
        assert_eq!(
            TaskGraph::build(&tasks, &[]).unwrap_err(),
            ScheduleError::DuplicateTask("a".to_string())
        );
    }

    #[test]
    fn test_offset_past_calendar_is_error() {
        let tasks = tasks(&[("a", 1.0)]);
        let graph = TaskGraph::build(&tasks, &[]).unwrap();
        let err = critical_path_pass(&graph, &tasks, &[4_000_000_000], start()).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::BeyondCalendar {
                task_id: "a".into()
            }
        );
    }

    #[test]
    fn test_root_task_honors_start_date() {
        let mut tasks = tasks(&[("a", 2.0)]);
        tasks[0].start_date = Some(start() + chrono::Duration::days(4));
        let nodes = run(&tasks, &[]).unwrap();
        assert_eq!(nodes[0].early_start, 4);
        assert_eq!(nodes[0].scheduled_start, start() + chrono::Duration::days(4));
    }
}

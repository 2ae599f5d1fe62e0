use crate::engines::generation::individual::Individual;
use crate::types::PopulationEntry;
use std::collections::HashSet;

/// Best distinct texts seen over a whole session, fitness descending.
#[derive(Debug, Clone)]
pub struct HallOfFame {
    entries: Vec<PopulationEntry>,
    max_size: usize,
    seen_texts: HashSet<String>,
}

impl HallOfFame {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_size,
            seen_texts: HashSet::new(),
        }
    }

    /// Attempt to add an entry; duplicates by text are rejected
    pub fn try_add(&mut self, entry: PopulationEntry) -> bool {
        if self.seen_texts.contains(&entry.text) {
            return false;
        }

        self.seen_texts.insert(entry.text.clone());
        self.entries.push(entry);

        self.entries.sort_by(|a, b| {
            b.fitness.partial_cmp(&a.fitness).unwrap_or(std::cmp::Ordering::Equal)
        });

        while self.entries.len() > self.max_size {
            if let Some(removed) = self.entries.pop() {
                self.seen_texts.remove(&removed.text);
            }
        }

        true
    }

    pub fn record(&mut self, individuals: &[Individual]) {
        for individual in individuals {
            self.try_add(individual.to_entry());
        }
    }

    pub fn get_all(&self) -> &[PopulationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

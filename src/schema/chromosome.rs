//! Chromosomes and diploid genomes.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::gene::Gene;

/// One recorded true insertion: where the gene landed and how many meioses
/// the record has survived since.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insertion {
    pub position: usize,
    pub age: u32,
}

/// Ordered genes plus their insertion history.
///
/// The history is kept sorted ascending by position. Every operation that
/// changes the gene layout keeps the recorded positions in step with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    genes: Vec<Gene>,
    #[serde(default)]
    insertions: Vec<Insertion>,
}

impl Chromosome {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chromosome with no recorded insertions.
    pub fn from_genes(genes: Vec<Gene>) -> Self {
        Self {
            genes,
            insertions: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Gene at `index`, or `None` past the end.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Gene> {
        self.genes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Gene> {
        self.genes.get_mut(index)
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut [Gene] {
        &mut self.genes
    }

    /// Number of genes that are not NoOp placeholders.
    pub fn expressed_len(&self) -> usize {
        self.genes.iter().filter(|g| !g.is_no_op()).count()
    }

    /// Append a gene. Appending is not a recorded insertion.
    pub fn push(&mut self, gene: Gene) {
        self.genes.push(gene);
    }

    /// Insert a gene at `index` (clamped to the length) without recording it.
    /// Recorded positions at or after the insertion point shift by one.
    /// Returns the position actually used.
    pub fn insert(&mut self, index: usize, gene: Gene) -> usize {
        let index = index.min(self.genes.len());
        self.genes.insert(index, gene);
        for entry in &mut self.insertions {
            if entry.position >= index {
                entry.position += 1;
            }
        }
        index
    }

    /// Insert a gene and record the insertion in the history.
    pub fn insert_recorded(&mut self, index: usize, gene: Gene, max_history: usize) -> usize {
        let index = self.insert(index, gene);
        self.record_insertion(Insertion {
            position: index,
            age: 0,
        });
        self.trim_history(max_history);
        index
    }

    /// Remove the gene at `index`. Records at that position are dropped and
    /// later records shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<Gene> {
        if index >= self.genes.len() {
            return None;
        }
        let gene = self.genes.remove(index);
        self.insertions.retain(|e| e.position != index);
        for entry in &mut self.insertions {
            if entry.position > index {
                entry.position -= 1;
            }
        }
        Some(gene)
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.genes.swap(a, b);
    }

    /// Recorded insertions, ascending by position.
    pub fn insertions(&self) -> &[Insertion] {
        &self.insertions
    }

    /// Add a record, keeping ascending position order. Records that share a
    /// position keep their arrival order.
    pub fn record_insertion(&mut self, entry: Insertion) {
        let at = self
            .insertions
            .partition_point(|e| e.position <= entry.position);
        self.insertions.insert(at, entry);
    }

    /// Whether the history satisfies its ordering invariant.
    pub fn history_is_sorted(&self) -> bool {
        self.insertions
            .windows(2)
            .all(|w| w[0].position <= w[1].position)
    }

    /// Age every record by one meiosis.
    pub fn age_history(&mut self) {
        for entry in &mut self.insertions {
            entry.age = entry.age.saturating_add(1);
        }
    }

    /// Discard the single oldest record, if any.
    pub fn discard_oldest_insertion(&mut self) -> Option<Insertion> {
        let oldest = self
            .insertions
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.age.cmp(&b.age).then(ib.cmp(ia)))
            .map(|(i, _)| i)?;
        Some(self.insertions.remove(oldest))
    }

    /// Discard oldest records until at most `max` remain.
    pub fn trim_history(&mut self, max: usize) {
        while self.insertions.len() > max {
            self.discard_oldest_insertion();
        }
    }

    /// Records in place. Callers must keep positions ascending.
    pub(crate) fn insertions_mut(&mut self) -> &mut [Insertion] {
        &mut self.insertions
    }

    pub(crate) fn set_insertions(&mut self, insertions: Vec<Insertion>) {
        self.insertions = insertions;
    }
}

/// Which chromosome of a genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    First,
    Second,
}

/// Reference to one gene of a genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneRef {
    pub strand: Strand,
    pub index: usize,
}

/// Diploid genome: an unordered pair of chromosomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    first: Chromosome,
    second: Chromosome,
}

impl Genome {
    pub fn new(first: Chromosome, second: Chromosome) -> Self {
        Self { first, second }
    }

    /// Both chromosomes carry the same genes.
    pub fn homozygous(chromosome: Chromosome) -> Self {
        Self {
            first: chromosome.clone(),
            second: chromosome,
        }
    }

    pub fn first(&self) -> &Chromosome {
        &self.first
    }

    pub fn second(&self) -> &Chromosome {
        &self.second
    }

    pub fn strand(&self, strand: Strand) -> &Chromosome {
        match strand {
            Strand::First => &self.first,
            Strand::Second => &self.second,
        }
    }

    /// Both chromosomes, mutably.
    pub fn pair_mut(&mut self) -> (&mut Chromosome, &mut Chromosome) {
        (&mut self.first, &mut self.second)
    }

    pub fn into_pair(self) -> (Chromosome, Chromosome) {
        (self.first, self.second)
    }

    pub fn gene(&self, at: GeneRef) -> Option<&Gene> {
        self.strand(at.strand).get(at.index)
    }

    /// Longest of the two chromosomes.
    pub fn len(&self) -> usize {
        self.first.len().max(self.second.len())
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty()
    }

    /// Total number of expressed genes over both chromosomes.
    pub fn expressed_len(&self) -> usize {
        self.first.expressed_len() + self.second.expressed_len()
    }

    /// Length difference between the two chromosomes.
    pub fn length_difference(&self) -> usize {
        self.first.len().abs_diff(self.second.len())
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, GenomeIoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, GenomeIoError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write this genome to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GenomeIoError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a genome from a JSON file. The insertion histories must be sorted.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GenomeIoError> {
        let genome = Self::from_json(&fs::read_to_string(path)?)?;
        if !genome.first.history_is_sorted() || !genome.second.history_is_sorted() {
            return Err(GenomeIoError::UnsortedHistory);
        }
        Ok(genome)
    }
}

/// Errors from reading or writing genome files.
#[derive(Debug, thiserror::Error)]
pub enum GenomeIoError {
    #[error("Genome file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Genome JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Insertion history is not sorted by position")]
    UnsortedHistory,
}

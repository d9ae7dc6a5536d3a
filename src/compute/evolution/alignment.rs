//! Cross-genome alignment.
//!
//! Two sister chromosomes drift apart in length through independent
//! insertions. Alignment uses their insertion histories to put filler NoOps
//! back where the sister chromosome gained a gene, so that equal indices on
//! both chromosomes refer to corresponding genes again.
//!
//! Both histories must be sorted ascending by position with distinct
//! positions. `Chromosome::insert_recorded` maintains this and
//! `Genome::load` rejects files that break the ordering.

use crate::schema::{Chromosome, Gene, Genome, Insertion};

/// Align the two chromosomes of `genome`.
///
/// The length difference never grows, no expressed gene changes, and a
/// second call on the result is a no-op.
pub fn align(genome: Genome, max_history: usize) -> Genome {
    let (mut first, mut second) = genome.into_pair();
    align_pair(&mut first, &mut second, max_history);
    Genome::new(first, second)
}

/// Align two chromosomes in place.
pub fn align_pair(a: &mut Chromosome, b: &mut Chromosome, max_history: usize) {
    debug_assert!(a.history_is_sorted() && b.history_is_sorted());
    let before = (a.len(), b.len());

    // More unmatched records than the length difference accounts for would
    // push the two lengths past each other; the oldest go first.
    {
        let (long, short) = if a.len() >= b.len() {
            (&mut *a, &mut *b)
        } else {
            (&mut *b, &mut *a)
        };
        let difference = long.len() - short.len();
        while long.insertions().len() > short.insertions().len() + difference {
            long.discard_oldest_insertion();
        }
        while short.insertions().len() > long.insertions().len() {
            short.discard_oldest_insertion();
        }
    }

    // After step `i` both histories agree on their first `i + 1` entries.
    let mut i = 0;
    loop {
        match (a.insertions().get(i).copied(), b.insertions().get(i).copied()) {
            (None, None) => break,
            (Some(x), Some(y)) if x.position == y.position => {
                let age = x.age.max(y.age);
                a.insertions_mut()[i].age = age;
                b.insertions_mut()[i].age = age;
            }
            (Some(x), Some(y)) if x.position < y.position => fill(b, a, x),
            (Some(x), None) => fill(b, a, x),
            (_, Some(y)) => fill(a, b, y),
        }
        i += 1;
    }

    a.trim_history(max_history);
    b.trim_history(max_history);

    log::trace!(
        "Aligned chromosomes {:?} -> ({}, {}) with {} shared insertions",
        before,
        a.len(),
        b.len(),
        a.insertions().len()
    );
}

/// Dominance for a filler facing `counterpart`: one step behind it, so the
/// real gene is always the one expressed.
fn filler_dominance(counterpart: Option<&Gene>) -> u64 {
    counterpart.map_or(0, |gene| gene.dominance.wrapping_sub(1))
}

/// Mirror `entry` of `source` into `target` with a filler NoOp.
///
/// When the position lies past the end of `target`, the gap is padded with
/// unrecorded fillers first.
fn fill(target: &mut Chromosome, source: &Chromosome, entry: Insertion) {
    while target.len() < entry.position {
        let index = target.len();
        target.push(Gene::no_op(filler_dominance(source.get(index))));
    }
    let filler = Gene::no_op(filler_dominance(source.get(entry.position)));
    target.insert(entry.position, filler);
    target.record_insertion(entry);
}

/// Genome representation for the coevolutionary search
///
/// A genome is the ordered list of genetic operators an individual applies to
/// the shared starting program during every epoch. The resulting tree is the
/// phenotype; it is rebuilt from scratch each generation, so only the genome
/// (and the fitness history) is heritable.
///
/// # Example
///
/// ```
/// use coevo::engines::generation::{Genome, Strategy};
///
/// let genome: Genome = vec![Strategy::MutateTerminal, Strategy::AddSubTree];
/// // Applied in order: mutate a leaf, then graft a random donor under `+`.
/// assert_eq!(genome.len(), 2);
/// ```
pub type Genome = Vec<super::strategy::Strategy>;

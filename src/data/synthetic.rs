use std::collections::HashSet;

use super::index::FUNNELED;
use super::model::{AnnotationRecord, Catalog, File, FileId, Membership, Pair};
use super::protocol::{Fold, VIEW2_FOLDS};

// ---------------------------------------------------------------------------
// Deterministic PRNG
// ---------------------------------------------------------------------------

/// Minimal deterministic PRNG (xoshiro256**)
pub struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `0..n`; `n` must be non-zero.
    pub fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Generator configuration
// ---------------------------------------------------------------------------

/// Shape of a generated catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    /// People assigned to each of the ten folds.
    pub people_per_fold: usize,
    /// Upper bound of images per person (at least 2).
    pub max_images_per_person: usize,
    /// Pairs per ten-fold fold, half of them matches.
    pub pairs_per_fold: usize,
    /// People per fold that also take part in view 1.
    pub view1_people_per_fold: usize,
    pub view1_train_pairs: usize,
    pub view1_test_pairs: usize,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            people_per_fold: 60,
            max_images_per_person: 6,
            pairs_per_fold: 60,
            view1_people_per_fold: 20,
            view1_train_pairs: 220,
            view1_test_pairs: 100,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    /// A catalog small enough for unit tests.
    pub fn small() -> Self {
        Self {
            people_per_fold: 8,
            max_images_per_person: 4,
            pairs_per_fold: 6,
            view1_people_per_fold: 3,
            view1_train_pairs: 10,
            view1_test_pairs: 6,
            seed: 7,
        }
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

struct Person {
    name: String,
    files: Vec<FileId>,
}

/// Generate a valid catalog with the shape described by `config`.
pub fn generate(config: &SyntheticConfig) -> Catalog {
    let mut rng = SimpleRng::new(config.seed);
    let mut catalog = Catalog::default();
    let max_images = config.max_images_per_person.max(2);
    let mut next_id: FileId = 1;

    // People and their images, fold by fold.
    let mut folds: Vec<Vec<Person>> = Vec::new();
    for fold in 1..=VIEW2_FOLDS {
        let mut people = Vec::new();
        for i in 0..config.people_per_fold {
            let name = format!("Person_{fold:02}_{i:03}");
            // Every other person gets at least two images so match pairs exist.
            let count = if i % 2 == 0 {
                2 + rng.below(max_images - 1)
            } else {
                1 + rng.below(max_images)
            };
            let mut files = Vec::with_capacity(count);
            for k in 1..=count {
                catalog.files.push(File {
                    id: next_id,
                    client_id: name.clone(),
                    path: format!("{name}/{name}_{k:04}"),
                });
                catalog.annotations.extend(eye_annotations(next_id, &mut rng));
                files.push(next_id);
                next_id += 1;
            }
            catalog.memberships.push(Membership {
                fold: Fold::View2(fold),
                client_id: name.clone(),
            });
            people.push(Person { name, files });
        }
        folds.push(people);
    }

    // Ten-fold pairs.
    for (n, people) in folds.iter().enumerate() {
        let fold = Fold::View2(n as u8 + 1);
        let refs: Vec<&Person> = people.iter().collect();
        catalog
            .pairs
            .extend(draw_pairs(fold, &refs, config.pairs_per_fold, &mut rng));
    }

    // View 1 reuses people: the first folds train, the last folds test.
    let half = folds.len() / 2;
    for (fold, range, pair_count) in [
        (Fold::View1Train, 0..half, config.view1_train_pairs),
        (Fold::View1Test, half..folds.len(), config.view1_test_pairs),
    ] {
        let members: Vec<&Person> = folds[range]
            .iter()
            .flat_map(|people| people.iter().take(config.view1_people_per_fold))
            .collect();
        for person in &members {
            catalog.memberships.push(Membership {
                fold,
                client_id: person.name.clone(),
            });
        }
        catalog
            .pairs
            .extend(draw_pairs(fold, &members, pair_count, &mut rng));
    }

    catalog
}

fn eye_annotations(file_id: FileId, rng: &mut SimpleRng) -> [AnnotationRecord; 2] {
    let record = |landmark: &str, y: f64, x: f64| AnnotationRecord {
        file_id,
        annotation_type: FUNNELED.to_string(),
        landmark: landmark.to_string(),
        y,
        x,
    };
    [
        record("reye", rng.gauss(115.0, 2.0), rng.gauss(100.0, 2.0)),
        record("leye", rng.gauss(115.0, 2.0), rng.gauss(150.0, 2.0)),
    ]
}

/// Draw up to `count` distinct pairs among `people`, half of them matches.
fn draw_pairs(fold: Fold, people: &[&Person], count: usize, rng: &mut SimpleRng) -> Vec<Pair> {
    let matchable: Vec<&&Person> = people.iter().filter(|p| p.files.len() >= 2).collect();
    let mut seen: HashSet<(FileId, FileId)> = HashSet::new();
    let mut pairs = Vec::with_capacity(count);
    let mut attempts = 0;

    while pairs.len() < count && attempts < count * 50 {
        attempts += 1;
        let want_match = pairs.len() < count / 2;
        let (enrol_file, probe_file) = if want_match {
            if matchable.is_empty() {
                continue;
            }
            let person = matchable[rng.below(matchable.len())];
            let a = rng.below(person.files.len());
            let b = (a + 1 + rng.below(person.files.len() - 1)) % person.files.len();
            (person.files[a], person.files[b])
        } else {
            if people.len() < 2 {
                break;
            }
            let a = rng.below(people.len());
            let b = (a + 1 + rng.below(people.len() - 1)) % people.len();
            let first = &people[a].files;
            let second = &people[b].files;
            (first[rng.below(first.len())], second[rng.below(second.len())])
        };
        if seen.insert((enrol_file, probe_file)) {
            pairs.push(Pair {
                fold,
                enrol_file,
                probe_file,
                is_match: want_match,
            });
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::index::CatalogIndex;

    #[test]
    fn generation_is_deterministic() {
        let config = SyntheticConfig::small();
        assert_eq!(generate(&config), generate(&config));
    }

    #[test]
    fn generated_catalog_is_valid() {
        let catalog = generate(&SyntheticConfig::small());
        assert_eq!(catalog.memberships.len(), 8 * 10 + 3 * 10);
        assert_eq!(
            catalog.pairs.iter().filter(|p| p.fold == Fold::View2(4)).count(),
            6
        );
        CatalogIndex::build(catalog).unwrap();
    }

    #[test]
    fn match_pairs_share_a_client() {
        let catalog = generate(&SyntheticConfig::small());
        let owner = |id: FileId| {
            catalog
                .files
                .iter()
                .find(|f| f.id == id)
                .map(|f| f.client_id.clone())
        };
        for pair in &catalog.pairs {
            assert_ne!(pair.enrol_file, pair.probe_file);
            assert_eq!(
                owner(pair.enrol_file) == owner(pair.probe_file),
                pair.is_match
            );
        }
    }
}

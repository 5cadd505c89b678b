use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use super::model::{Catalog, Client, File, FileId, Landmarks, Pair};
use super::protocol::Fold;
use crate::error::CatalogError;

/// Annotation type whose sets must carry both eye centres.
pub const FUNNELED: &str = "funneled";

/// Landmarks every [`FUNNELED`] annotation set contains.
pub const EYE_LANDMARKS: [&str; 2] = ["leye", "reye"];

// ---------------------------------------------------------------------------
// FoldIndex – everything a query needs to know about one fold
// ---------------------------------------------------------------------------

/// Precomputed tables of one fold.
#[derive(Debug, Clone, Default)]
pub struct FoldIndex {
    /// People assigned to the fold.
    pub members: BTreeSet<String>,
    /// Every file of the fold's people (the unrestricted training set).
    pub member_files: BTreeSet<FileId>,
    /// Positions of the fold's pairs in [`CatalogIndex::pairs`].
    pub pairs: Vec<usize>,
    /// Files referenced by a pair (the restricted training set).
    pub pair_files: BTreeSet<FileId>,
    /// Owners of `pair_files`.
    pub pair_clients: BTreeSet<String>,
    pub enrol_files: BTreeSet<FileId>,
    pub probe_files: BTreeSet<FileId>,
    /// Enrollment file → probe files it is compared against.
    pub probes_by_model: BTreeMap<FileId, BTreeSet<FileId>>,
}

// ---------------------------------------------------------------------------
// CatalogIndex – validated catalog plus lookup tables
// ---------------------------------------------------------------------------

/// The catalog after validation, with index tables built once at load time.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    pub files: BTreeMap<FileId, File>,
    pub paths: HashMap<String, FileId>,
    pub clients: BTreeMap<String, Client>,
    pub pairs: Vec<Pair>,
    pub folds: BTreeMap<Fold, FoldIndex>,
    /// File → annotation type → landmarks.
    pub annotations: BTreeMap<FileId, BTreeMap<String, Landmarks>>,
    pub annotation_types: BTreeSet<String>,
}

impl CatalogIndex {
    /// Validate `catalog` and build its index tables.
    pub fn build(catalog: Catalog) -> Result<Self, CatalogError> {
        let Catalog {
            files,
            memberships,
            pairs,
            annotations,
        } = catalog;

        let mut index = CatalogIndex::default();

        // -- files and clients --
        for file in files {
            if index.paths.insert(file.path.clone(), file.id).is_some() {
                return Err(CatalogError::DuplicatePath(file.path));
            }
            index
                .clients
                .entry(file.client_id.clone())
                .or_insert_with(|| Client {
                    id: file.client_id.clone(),
                    file_ids: Vec::new(),
                })
                .file_ids
                .push(file.id);
            if let Some(previous) = index.files.insert(file.id, file) {
                return Err(CatalogError::DuplicateFileId(previous.id));
            }
        }
        for client in index.clients.values_mut() {
            client.file_ids.sort_unstable();
        }

        // -- memberships --
        let mut view2_home: HashMap<String, Fold> = HashMap::new();
        for membership in memberships {
            let client = index.clients.get(&membership.client_id).ok_or_else(|| {
                CatalogError::UnknownMember {
                    fold: membership.fold,
                    client_id: membership.client_id.clone(),
                }
            })?;
            if membership.fold.is_view2() {
                if let Some(first) = view2_home.get(&membership.client_id) {
                    if *first != membership.fold {
                        return Err(CatalogError::ClientInSeveralFolds {
                            client_id: membership.client_id,
                            first: *first,
                            second: membership.fold,
                        });
                    }
                }
                view2_home.insert(membership.client_id.clone(), membership.fold);
            }
            let fold = index.folds.entry(membership.fold).or_default();
            fold.member_files.extend(client.file_ids.iter().copied());
            fold.members.insert(membership.client_id);
        }

        // -- pairs --
        for (position, pair) in pairs.into_iter().enumerate() {
            let fold = index.folds.entry(pair.fold).or_default();
            for file_id in [pair.enrol_file, pair.probe_file] {
                let file = index.files.get(&file_id).ok_or(CatalogError::PairUnknownFile {
                    fold: pair.fold,
                    file_id,
                })?;
                if !fold.members.contains(&file.client_id) {
                    return Err(CatalogError::PairOutsideFold {
                        fold: pair.fold,
                        file_id,
                        client_id: file.client_id.clone(),
                    });
                }
                fold.pair_files.insert(file_id);
                fold.pair_clients.insert(file.client_id.clone());
            }
            fold.pairs.push(position);
            fold.enrol_files.insert(pair.enrol_file);
            fold.probe_files.insert(pair.probe_file);
            fold.probes_by_model
                .entry(pair.enrol_file)
                .or_default()
                .insert(pair.probe_file);
            index.pairs.push(pair);
        }

        // -- annotations --
        for record in annotations {
            if !index.files.contains_key(&record.file_id) {
                return Err(CatalogError::AnnotationUnknownFile {
                    file_id: record.file_id,
                    annotation_type: record.annotation_type,
                });
            }
            index.annotation_types.insert(record.annotation_type.clone());
            index
                .annotations
                .entry(record.file_id)
                .or_default()
                .entry(record.annotation_type)
                .or_default()
                .insert(record.landmark, [record.y, record.x]);
        }
        for (file_id, by_type) in &index.annotations {
            if let Some(landmarks) = by_type.get(FUNNELED) {
                if let Some(missing) = EYE_LANDMARKS.iter().find(|l| !landmarks.contains_key(**l)) {
                    return Err(CatalogError::MissingLandmark {
                        file_id: *file_id,
                        annotation_type: FUNNELED.to_string(),
                        landmark: *missing,
                    });
                }
            }
        }

        debug!(
            "indexed {} files, {} clients, {} pairs over {} folds, {} annotated files",
            index.files.len(),
            index.clients.len(),
            index.pairs.len(),
            index.folds.len(),
            index.annotations.len()
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AnnotationRecord, Membership};

    fn file(id: FileId, client: &str) -> File {
        File {
            id,
            client_id: client.to_string(),
            path: format!("{client}/{client}_{id:04}"),
        }
    }

    fn member(fold: Fold, client: &str) -> Membership {
        Membership {
            fold,
            client_id: client.to_string(),
        }
    }

    fn pair(fold: Fold, enrol_file: FileId, probe_file: FileId, is_match: bool) -> Pair {
        Pair {
            fold,
            enrol_file,
            probe_file,
            is_match,
        }
    }

    fn small_catalog() -> Catalog {
        Catalog {
            files: vec![file(1, "Ann"), file(2, "Ann"), file(3, "Bob"), file(4, "Cid")],
            memberships: vec![
                member(Fold::View2(1), "Ann"),
                member(Fold::View2(1), "Bob"),
                member(Fold::View2(2), "Cid"),
                member(Fold::View1Train, "Ann"),
            ],
            pairs: vec![
                pair(Fold::View2(1), 1, 2, true),
                pair(Fold::View2(1), 1, 3, false),
                pair(Fold::View1Train, 2, 1, true),
            ],
            annotations: Vec::new(),
        }
    }

    #[test]
    fn builds_fold_tables() {
        let index = CatalogIndex::build(small_catalog()).unwrap();
        let fold1 = &index.folds[&Fold::View2(1)];
        assert_eq!(fold1.member_files, BTreeSet::from([1, 2, 3]));
        assert_eq!(fold1.pairs, vec![0, 1]);
        assert_eq!(fold1.enrol_files, BTreeSet::from([1]));
        assert_eq!(fold1.probe_files, BTreeSet::from([2, 3]));
        assert_eq!(fold1.probes_by_model[&1], BTreeSet::from([2, 3]));
        assert_eq!(index.clients["Ann"].file_ids, vec![1, 2]);
        assert_eq!(index.paths["Cid/Cid_0004"], 4);
    }

    #[test]
    fn rejects_duplicate_file_ids() {
        let mut catalog = small_catalog();
        catalog.files.push(File {
            id: 1,
            client_id: "Dee".into(),
            path: "Dee/Dee_0001".into(),
        });
        assert_eq!(
            CatalogIndex::build(catalog).unwrap_err(),
            CatalogError::DuplicateFileId(1)
        );
    }

    #[test]
    fn rejects_client_in_two_view2_folds() {
        let mut catalog = small_catalog();
        catalog.memberships.push(member(Fold::View2(3), "Bob"));
        assert!(matches!(
            CatalogIndex::build(catalog),
            Err(CatalogError::ClientInSeveralFolds { .. })
        ));
    }

    #[test]
    fn rejects_pairs_leaving_their_fold() {
        let mut catalog = small_catalog();
        catalog.pairs.push(pair(Fold::View2(1), 1, 4, false));
        assert_eq!(
            CatalogIndex::build(catalog).unwrap_err(),
            CatalogError::PairOutsideFold {
                fold: Fold::View2(1),
                file_id: 4,
                client_id: "Cid".into(),
            }
        );
    }

    #[test]
    fn rejects_funneled_sets_without_both_eyes() {
        let mut catalog = small_catalog();
        catalog.annotations.push(AnnotationRecord {
            file_id: 3,
            annotation_type: FUNNELED.into(),
            landmark: "leye".into(),
            y: 10.0,
            x: 20.0,
        });
        assert!(matches!(
            CatalogIndex::build(catalog),
            Err(CatalogError::MissingLandmark { file_id: 3, landmark: "reye", .. })
        ));
    }
}

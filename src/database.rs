//! The dataset query service.
//!
//! A [`Database`] owns the validated, indexed catalog and answers every
//! retrieval query from it. It never mutates after construction, so a single
//! instance can be shared freely.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::data::filter::{select_or_all, ObjectQuery};
use crate::data::index::{CatalogIndex, FoldIndex, EYE_LANDMARKS, FUNNELED};
use crate::data::loader;
use crate::data::model::{Catalog, Client, File, FileId, Landmarks, Model, Pair};
use crate::data::protocol::{
    Fold, Group, PairLabel, Protocol, Purpose, Subworld, WorldType,
};
use crate::error::CatalogError;

/// Read-only query service over one catalog.
#[derive(Debug, Clone)]
pub struct Database {
    index: CatalogIndex,
}

impl Database {
    /// Load, validate and index the catalog at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let catalog = loader::load_catalog(path)?;
        let db = Self::from_catalog(catalog)
            .with_context(|| format!("validating catalog {}", path.display()))?;
        info!(
            "opened catalog {} ({} files, {} clients, {} pairs)",
            path.display(),
            db.index.files.len(),
            db.index.clients.len(),
            db.index.pairs.len()
        );
        Ok(db)
    }

    /// Validate and index an in-memory catalog.
    pub fn from_catalog(catalog: Catalog) -> Result<Self, CatalogError> {
        Ok(Self {
            index: CatalogIndex::build(catalog)?,
        })
    }

    // -----------------------------------------------------------------------
    // Valid filter values
    // -----------------------------------------------------------------------

    pub fn protocol_names(&self) -> Vec<String> {
        Protocol::names()
    }

    pub fn groups(&self) -> Vec<&'static str> {
        Group::ALL.iter().map(|g| g.name()).collect()
    }

    pub fn purposes(&self) -> Vec<&'static str> {
        Purpose::ALL.iter().map(|p| p.name()).collect()
    }

    pub fn world_types(&self) -> Vec<&'static str> {
        WorldType::ALL.iter().map(|w| w.name()).collect()
    }

    pub fn subworld_names(&self) -> Vec<&'static str> {
        Subworld::names()
    }

    // -----------------------------------------------------------------------
    // Fold resolution helpers
    // -----------------------------------------------------------------------

    /// Folds covered by `groups` of `protocol` (all protocols when `None`).
    fn folds_for(
        &self,
        protocol: Option<Protocol>,
        groups: &[Group],
        subworld: Subworld,
    ) -> BTreeSet<Fold> {
        let protocols = protocol.map_or_else(Protocol::all, |p| vec![p]);
        let groups = select_or_all(&groups.iter().copied().collect(), Group::ALL.to_vec());
        protocols
            .iter()
            .flat_map(|p| groups.iter().flat_map(move |g| p.folds(*g, subworld)))
            .collect()
    }

    fn fold_tables(&self, folds: impl IntoIterator<Item = Fold>) -> Vec<&FoldIndex> {
        folds
            .into_iter()
            .filter_map(|fold| self.index.folds.get(&fold))
            .collect()
    }

    fn resolve_files(&self, ids: BTreeSet<FileId>) -> Vec<&File> {
        ids.iter().filter_map(|id| self.index.files.get(id)).collect()
    }

    fn resolve_clients(&self, ids: BTreeSet<&String>) -> Vec<&Client> {
        ids.into_iter()
            .filter_map(|id| self.index.clients.get(id))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Clients
    // -----------------------------------------------------------------------

    /// Clients of `groups` in `protocol`.
    ///
    /// Every group's clients are the people of its folds. With
    /// [`WorldType::Restricted`] the world keeps only those appearing in a
    /// world pair; dev and eval do not depend on the world type.
    pub fn clients(
        &self,
        protocol: Option<Protocol>,
        groups: &[Group],
        world_type: WorldType,
    ) -> Vec<&Client> {
        let protocols = protocol.map_or_else(Protocol::all, |p| vec![p]);
        let groups = select_or_all(&groups.iter().copied().collect(), Group::ALL.to_vec());
        let mut ids: BTreeSet<&String> = BTreeSet::new();
        for p in &protocols {
            for group in &groups {
                let folds = p.folds(*group, Subworld::default());
                for table in self.fold_tables(folds) {
                    match (group, world_type) {
                        (Group::World, WorldType::Restricted) => ids.extend(&table.pair_clients),
                        _ => ids.extend(&table.members),
                    }
                }
            }
        }
        self.resolve_clients(ids)
    }

    pub fn client(&self, id: &str) -> Option<&Client> {
        self.index.clients.get(id)
    }

    /// Whether `id` names a known client.
    pub fn has_client_id(&self, id: &str) -> bool {
        self.index.clients.contains_key(id)
    }

    // -----------------------------------------------------------------------
    // Models
    // -----------------------------------------------------------------------

    fn model_for(&self, id: FileId) -> Option<Model> {
        self.index.files.get(&id).map(|file| Model {
            id,
            client_id: file.client_id.clone(),
            file_ids: vec![id],
        })
    }

    fn models_of_folds(&self, folds: impl IntoIterator<Item = Fold>) -> Vec<Model> {
        let ids: BTreeSet<FileId> = self
            .fold_tables(folds)
            .into_iter()
            .flat_map(|table| table.enrol_files.iter().copied())
            .collect();
        ids.into_iter().filter_map(|id| self.model_for(id)).collect()
    }

    /// Enrollment models of the dev and eval `groups`; the world has none.
    pub fn models(&self, protocol: Option<Protocol>, groups: &[Group]) -> Vec<Model> {
        let scoring: Vec<Group> = select_or_all(&groups.iter().copied().collect(), Group::ALL.to_vec())
            .into_iter()
            .filter(|g| *g != Group::World)
            .collect();
        if scoring.is_empty() {
            return Vec::new();
        }
        self.models_of_folds(self.folds_for(protocol, &scoring, Subworld::default()))
    }

    pub fn model_ids(&self, protocol: Option<Protocol>, groups: &[Group]) -> Vec<FileId> {
        self.models(protocol, groups).iter().map(|m| m.id).collect()
    }

    /// T-norm models of `protocol`, drawn from its normalisation folds.
    pub fn tmodels(&self, protocol: Protocol) -> Vec<Model> {
        self.models_of_folds(protocol.tnorm_folds())
    }

    /// Ids of the T-norm models used to normalise `groups` of `protocol`.
    ///
    /// The same T-norm cohort serves every group.
    pub fn tmodel_ids(&self, protocol: Protocol, _groups: &[Group]) -> Vec<FileId> {
        self.tmodels(protocol).iter().map(|m| m.id).collect()
    }

    // -----------------------------------------------------------------------
    // File objects
    // -----------------------------------------------------------------------

    /// Files matching every criterion of `query`, sorted by id.
    pub fn objects(&self, query: &ObjectQuery) -> Vec<&File> {
        let mut ids: BTreeSet<FileId> = BTreeSet::new();
        for protocol in query.selected_protocols() {
            for group in query.selected_groups() {
                let folds = protocol.folds(group, query.subworld);
                for table in self.fold_tables(folds) {
                    match group {
                        Group::World => self.collect_world(table, query, &mut ids),
                        Group::Dev | Group::Eval => self.collect_scoring(table, query, &mut ids),
                    }
                }
            }
        }
        self.resolve_files(ids)
    }

    fn collect_world(&self, table: &FoldIndex, query: &ObjectQuery, ids: &mut BTreeSet<FileId>) {
        // Models only exist in the dev and eval groups.
        if query.model_ids.is_some() || !query.wants(Purpose::Train) {
            return;
        }
        match query.world_type {
            WorldType::Unrestricted => ids.extend(&table.member_files),
            WorldType::Restricted => ids.extend(&table.pair_files),
        }
    }

    fn collect_scoring(&self, table: &FoldIndex, query: &ObjectQuery, ids: &mut BTreeSet<FileId>) {
        if query.wants(Purpose::Enrol) {
            match &query.model_ids {
                Some(models) => ids.extend(table.enrol_files.intersection(models)),
                None => ids.extend(&table.enrol_files),
            }
        }
        if query.wants(Purpose::Probe) {
            match &query.model_ids {
                Some(models) => {
                    for model in models {
                        if let Some(probes) = table.probes_by_model.get(model) {
                            ids.extend(probes);
                        }
                    }
                }
                None => ids.extend(&table.probe_files),
            }
        }
    }

    /// Files used to enroll the T-norm models of `protocol`.
    pub fn tobjects(&self, protocol: Protocol) -> Vec<&File> {
        let ids = self
            .fold_tables(protocol.tnorm_folds())
            .into_iter()
            .flat_map(|table| table.enrol_files.iter().copied())
            .collect();
        self.resolve_files(ids)
    }

    /// Probe files used for Z-norm of `protocol`.
    pub fn zobjects(&self, protocol: Protocol) -> Vec<&File> {
        let ids = self
            .fold_tables(protocol.tnorm_folds())
            .into_iter()
            .flat_map(|table| table.probe_files.iter().copied())
            .collect();
        self.resolve_files(ids)
    }

    pub fn file(&self, id: FileId) -> Option<&File> {
        self.index.files.get(&id)
    }

    /// Every file of the catalog, sorted by id.
    pub fn all_files(&self) -> impl Iterator<Item = &File> {
        self.index.files.values()
    }

    /// Files whose relative path is one of `paths`; unknown paths are skipped.
    pub fn reverse<S: AsRef<str>>(&self, paths: &[S]) -> Vec<&File> {
        paths
            .iter()
            .filter_map(|p| self.index.paths.get(p.as_ref().trim_end_matches('/')))
            .filter_map(|id| self.index.files.get(id))
            .collect()
    }

    /// Full file name of `file` below `directory` with `extension` appended.
    pub fn original_file_name(&self, file: &File, directory: &Path, extension: &str) -> PathBuf {
        directory.join(format!("{}{}", file.path, extension))
    }

    /// Full file names of the known `ids`; unknown ids are skipped.
    pub fn paths(&self, ids: &[FileId], directory: &Path, extension: &str) -> Vec<PathBuf> {
        ids.iter()
            .filter_map(|id| self.file(*id))
            .map(|file| self.original_file_name(file, directory, extension))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Pairs
    // -----------------------------------------------------------------------

    /// Predefined pairs of `groups`, optionally only those with one of `labels`.
    pub fn pairs(
        &self,
        protocol: Option<Protocol>,
        groups: &[Group],
        labels: &[PairLabel],
    ) -> Vec<&Pair> {
        let folds = self.folds_for(protocol, groups, Subworld::default());
        self.fold_tables(folds)
            .into_iter()
            .flat_map(|table| table.pairs.iter().map(|i| &self.index.pairs[*i]))
            .filter(|pair| labels.is_empty() || labels.contains(&pair.label()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Annotations
    // -----------------------------------------------------------------------

    /// Landmarks of `file_id` for `annotation_type`; empty when either is unknown.
    pub fn annotations(&self, file_id: FileId, annotation_type: &str) -> Landmarks {
        self.index
            .annotations
            .get(&file_id)
            .and_then(|by_type| by_type.get(annotation_type))
            .cloned()
            .unwrap_or_default()
    }

    /// Every annotation set of `file_id`, keyed by type.
    pub fn all_annotations(&self, file_id: FileId) -> BTreeMap<String, Landmarks> {
        self.index
            .annotations
            .get(&file_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn annotation_types(&self) -> Vec<String> {
        self.index.annotation_types.iter().cloned().collect()
    }

    // -----------------------------------------------------------------------
    // Consistency
    // -----------------------------------------------------------------------

    /// Check the cross-query laws the benchmark relies on.
    pub fn self_check(&self) -> Result<(), CatalogError> {
        let fail = |message: String| Err(CatalogError::Inconsistent(message));

        for protocol in Protocol::all() {
            for group in [Group::Dev, Group::Eval] {
                let pairs = self.pairs(Some(protocol), &[group], &[]);
                let unique: BTreeSet<(FileId, FileId)> =
                    pairs.iter().map(|p| (p.enrol_file, p.probe_file)).collect();
                let probe_total: usize = self
                    .model_ids(Some(protocol), &[group])
                    .into_iter()
                    .map(|model| {
                        let query = ObjectQuery::new()
                            .protocol(protocol)
                            .group(group)
                            .purpose(Purpose::Probe)
                            .model_ids([model]);
                        self.objects(&query).len()
                    })
                    .sum();
                if probe_total != unique.len() {
                    return fail(format!(
                        "{protocol}/{group}: per-model probes sum to {probe_total} but there are {} distinct pairs",
                        unique.len()
                    ));
                }

                let base = ObjectQuery::new().protocol(protocol).group(group);
                let restricted = self.objects(&base.clone().world_type(WorldType::Restricted));
                let unrestricted = self.objects(&base.world_type(WorldType::Unrestricted));
                if restricted != unrestricted {
                    return fail(format!(
                        "{protocol}/{group}: restricted and unrestricted files differ"
                    ));
                }
            }

            let seven: BTreeSet<FileId> = self
                .objects(&ObjectQuery::new().protocol(protocol).group(Group::World))
                .iter()
                .map(|f| f.id)
                .collect();
            let five: BTreeSet<FileId> = self
                .objects(
                    &ObjectQuery::new()
                        .protocol(protocol)
                        .group(Group::World)
                        .subworld(Subworld::Fivefolds),
                )
                .iter()
                .map(|f| f.id)
                .collect();
            let normalisation = self.tobjects(protocol).into_iter().chain(self.zobjects(protocol));
            for file in normalisation {
                if !seven.contains(&file.id) {
                    return fail(format!(
                        "{protocol}: normalisation file {} is outside the world set",
                        file.id
                    ));
                }
                if protocol != Protocol::View1 && five.contains(&file.id) {
                    return fail(format!(
                        "{protocol}: normalisation file {} overlaps the fivefolds world",
                        file.id
                    ));
                }
            }
        }

        for (file_id, by_type) in &self.index.annotations {
            for (annotation_type, landmarks) in by_type {
                if annotation_type == FUNNELED
                    && EYE_LANDMARKS.iter().any(|l| !landmarks.contains_key(*l))
                {
                    return fail(format!("file {file_id} lacks eye landmarks"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{generate, SyntheticConfig};

    fn db() -> Database {
        Database::from_catalog(generate(&SyntheticConfig::small())).unwrap()
    }

    fn ids(files: &[&File]) -> BTreeSet<FileId> {
        files.iter().map(|f| f.id).collect()
    }

    #[test]
    fn default_query_returns_every_file() {
        let db = db();
        assert_eq!(db.objects(&ObjectQuery::new()).len(), db.all_files().count());
    }

    #[test]
    fn restricted_world_is_the_set_of_pair_files() {
        let db = db();
        let restricted = db.objects(&ObjectQuery::new().world_type(WorldType::Restricted));
        let pair_files: BTreeSet<FileId> = db
            .pairs(None, &[], &[])
            .iter()
            .flat_map(|p| [p.enrol_file, p.probe_file])
            .collect();
        assert_eq!(ids(&restricted), pair_files);
    }

    #[test]
    fn enrol_objects_match_models() {
        let db = db();
        for protocol in Protocol::all() {
            for group in [Group::Dev, Group::Eval] {
                let enrol = db.objects(
                    &ObjectQuery::new()
                        .protocol(protocol)
                        .group(group)
                        .purpose(Purpose::Enrol),
                );
                assert_eq!(enrol.len(), db.models(Some(protocol), &[group]).len());
            }
        }
    }

    #[test]
    fn world_has_no_models() {
        let db = db();
        assert!(db.models(Some(Protocol::Fold(2)), &[Group::World]).is_empty());
    }

    #[test]
    fn model_restriction_removes_world_files() {
        let db = db();
        let model = db.model_ids(Some(Protocol::Fold(4)), &[Group::Dev])[0];
        let query = ObjectQuery::new()
            .protocol(Protocol::Fold(4))
            .groups([Group::World, Group::Dev])
            .purpose(Purpose::Enrol)
            .model_ids([model]);
        assert_eq!(ids(&db.objects(&query)), BTreeSet::from([model]));
    }

    #[test]
    fn unknown_model_yields_nothing() {
        let db = db();
        let query = ObjectQuery::new()
            .protocol(Protocol::Fold(1))
            .group(Group::Dev)
            .model_ids([u32::MAX]);
        assert!(db.objects(&query).is_empty());
    }

    #[test]
    fn pairs_can_be_filtered_by_label() {
        let db = db();
        let all = db.pairs(Some(Protocol::Fold(5)), &[Group::Eval], &[]);
        let matches = db.pairs(Some(Protocol::Fold(5)), &[Group::Eval], &[PairLabel::Match]);
        let mismatches = db.pairs(Some(Protocol::Fold(5)), &[Group::Eval], &[PairLabel::Mismatch]);
        assert_eq!(matches.len() + mismatches.len(), all.len());
        assert!(matches.iter().all(|p| p.is_match));
    }

    #[test]
    fn scoring_clients_are_the_fold_members() {
        let db = db();
        let names = |group| -> BTreeSet<String> {
            db.clients(Some(Protocol::Fold(1)), &[group], WorldType::default())
                .iter()
                .map(|c| c.id.clone())
                .collect()
        };
        let dev = names(Group::Dev);
        let eval = names(Group::Eval);
        // Eight people per fold: dev covers folds 9 and 10, eval fold 1.
        assert_eq!(dev.len(), 16);
        assert_eq!(eval.len(), 8);
        assert!(dev.iter().all(|c| c.starts_with("Person_09_") || c.starts_with("Person_10_")));
        assert!(eval.iter().all(|c| c.starts_with("Person_01_")));
    }

    #[test]
    fn reverse_and_paths_agree() {
        let db = db();
        let file = db.all_files().nth(3).unwrap().clone();
        assert_eq!(db.reverse(&[file.path.as_str(), "Nobody/Nobody_0001"]), vec![&file]);
        assert_eq!(
            db.paths(&[file.id, u32::MAX], Path::new("/data"), ".jpg"),
            vec![PathBuf::from(format!("/data/{}.jpg", file.path))]
        );
    }

    #[test]
    fn unknown_annotation_lookups_are_empty() {
        let db = db();
        assert!(db.annotations(u32::MAX, FUNNELED).is_empty());
        assert!(db.annotations(1, "manual").is_empty());
        assert_eq!(db.annotation_types(), vec![FUNNELED.to_string()]);
    }

    #[test]
    fn synthetic_catalog_passes_self_check() {
        db().self_check().unwrap();
    }
}

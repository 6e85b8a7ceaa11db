use crate::config::ImagesConfig;
use crate::model::{ProcessKind, ProcessRecord};
use crate::process::artifact::{ArtifactResolver, resolver_for};
use crate::process::{ProcessTable, list_processes};

/// Builds fresh snapshots of the processes of a kind. Nothing is cached.
pub struct ProcessRegistry<'a> {
    table: &'a dyn ProcessTable,
    images: &'a ImagesConfig,
}

impl<'a> ProcessRegistry<'a> {
    pub fn new(table: &'a dyn ProcessTable, images: &'a ImagesConfig) -> Self {
        Self { table, images }
    }

    /// Records for `kind`, sorted by display name, descending.
    pub fn snapshot(&self, kind: ProcessKind) -> Vec<ProcessRecord> {
        self.snapshot_with(self.images.image_for(kind), resolver_for(kind))
    }

    pub fn snapshot_with(&self, image: &str, resolver: &dyn ArtifactResolver) -> Vec<ProcessRecord> {
        let mut records: Vec<ProcessRecord> = list_processes(self.table, image)
            .into_iter()
            .filter_map(|handle| {
                let artifact = resolver.resolve(self.table, &handle)?;
                Some(ProcessRecord::new(
                    handle,
                    artifact.display_name,
                    artifact.target_path,
                ))
            })
            .collect();

        records.sort_by(|a, b| b.display_name.cmp(&a.display_name));
        records
    }
}

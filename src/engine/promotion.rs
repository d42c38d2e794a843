//! engine::promotion
//!
//! Promotion candidates and promotion runs over a project.
//!
//! # Architecture
//!
//! The set of locations already controlled on the target branch is gathered
//! before the archive's exclusive section is entered, so no section is ever
//! held while another archive is read. The project namespace lock is held
//! from that scan until the promotion commits.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::types::{ArchiveLocation, BranchName, FileId};
use crate::promote::{self, FilePromotionInfo, PromoteOutcome, PromoteResult, PromotionContext, WorkArea};
use crate::txn::{Notification, RequestContext};

use super::files::ensure_writable;
use super::{EngineError, Project};

impl Project {
    /// Every file with a pending change on `branch`, ordered by location.
    pub fn promotion_candidates(
        &self,
        branch: &BranchName,
    ) -> Result<Vec<FilePromotionInfo>, EngineError> {
        self.graph().require(branch)?;
        let mut candidates = Vec::new();
        for id in self.archive_ids() {
            if let Some(info) =
                self.read_archive(id, |archive, graph| Ok(promote::promotion_candidate(archive, graph, branch)))?
            {
                candidates.push(info);
            }
        }
        candidates.sort_by(|a, b| a.source_location.cmp(&b.source_location));
        tracing::debug!(%branch, count = candidates.len(), "promotion candidates");
        Ok(candidates)
    }

    /// Promote one file into its branch's parent.
    ///
    /// Merged content is returned, not checked in; see
    /// [`PromoteOutcome::Merged`].
    pub fn promote(
        &self,
        ctx: &RequestContext,
        info: &FilePromotionInfo,
        work_area: &dyn WorkArea,
    ) -> Result<PromoteResult, EngineError> {
        let namespace = self.namespace();
        let controlled: HashSet<ArchiveLocation> = {
            let graph = self.graph();
            graph.require(&info.target_branch)?;
            ensure_writable(&graph, &info.target_branch)?;
            self.visible_on(&graph, &info.target_branch, Some(info.file_id))
                .into_iter()
                .map(|(_, loc)| loc)
                .collect()
        };

        let config = self.config();
        let result = self.mutate_archive(info.file_id, |archive, graph| {
            let pctx = PromotionContext {
                user: &ctx.user,
                timestamp: ctx.timestamp.clone(),
                work_area,
                promoted_suffix: config.promoted_suffix(),
                compression: config.compression(),
                controlled: &controlled,
            };
            Ok(promote::promote_file(archive, graph, info, &pctx)?)
        })?;
        drop(namespace);

        if result.outcome != PromoteOutcome::AlreadyPromoted {
            self.notify(
                ctx,
                Notification::Promoted {
                    file_id: info.file_id,
                    from: info.source_branch.clone(),
                    into: info.target_branch.clone(),
                },
            );
        }
        Ok(result)
    }

    /// Promote several files, one result per file attempted.
    ///
    /// `cancel` is checked between files; files promoted before it was
    /// raised stay promoted and the rest are skipped.
    pub fn promote_batch(
        &self,
        ctx: &RequestContext,
        infos: &[FilePromotionInfo],
        work_area: &dyn WorkArea,
        cancel: &AtomicBool,
    ) -> Vec<(FileId, Result<PromoteResult, EngineError>)> {
        let mut results = Vec::with_capacity(infos.len());
        for info in infos {
            if cancel.load(Ordering::SeqCst) {
                tracing::info!(
                    done = results.len(),
                    skipped = infos.len() - results.len(),
                    "promotion cancelled"
                );
                break;
            }
            let result = self.promote(ctx, info, work_area);
            if let Err(e) = &result {
                tracing::warn!(file_id = %info.file_id, error = %e, "promotion failed");
            }
            results.push((info.file_id, result));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{RevisionId, UserName};
    use crate::engine::RevisionSelector;
    use crate::promote::{NoWorkArea, PromotionType};
    use tempfile::TempDir;

    fn user() -> UserName {
        UserName::new("ann").unwrap()
    }

    fn b(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    fn loc(name: &str) -> ArchiveLocation {
        ArchiveLocation::new("", name).unwrap()
    }

    fn setup() -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        let p = Project::init(temp.path(), None).unwrap();
        let ctx = p.begin(user());
        p.create_branch(&ctx, b("feature"), BranchName::trunk()).unwrap();
        (temp, p)
    }

    #[test]
    fn candidates_cover_each_kind_of_change() {
        let (_t, p) = setup();
        let ctx = p.begin(user());
        let trunk = BranchName::trunk();
        let feature = b("feature");

        let edited = p.create_archive(&ctx, &trunk, loc("e.txt"), b"e\n".to_vec(), "", None).unwrap();
        let renamed = p.create_archive(&ctx, &trunk, loc("r.txt"), b"r\n".to_vec(), "", None).unwrap();
        let removed = p.create_archive(&ctx, &trunk, loc("d.txt"), b"d\n".to_vec(), "", None).unwrap();
        p.create_archive(&ctx, &trunk, loc("u.txt"), b"u\n".to_vec(), "", None).unwrap();

        p.checkin(&ctx, edited, &feature, b"e2\n".to_vec(), "").unwrap();
        p.rename(&ctx, renamed, &feature, "r2.txt").unwrap();
        p.delete(&ctx, removed, &feature).unwrap();
        p.create_archive(&ctx, &feature, loc("n.txt"), b"n\n".to_vec(), "", None).unwrap();

        let kinds: Vec<(String, PromotionType)> = p
            .promotion_candidates(&feature)
            .unwrap()
            .into_iter()
            .map(|c| (c.source_location.to_string(), c.promotion_type))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("d.txt".to_string(), PromotionType::FileDeleted),
                ("e.txt".to_string(), PromotionType::Simple),
                ("n.txt".to_string(), PromotionType::FileCreated),
                ("r2.txt".to_string(), PromotionType::FileNameChange),
            ]
        );
        assert!(p.promotion_candidates(&trunk).unwrap().is_empty());
    }

    #[test]
    fn promote_then_checkin_merged_content() {
        let (_t, p) = setup();
        let ctx = p.begin(user());
        let trunk = BranchName::trunk();
        let feature = b("feature");
        let id = p
            .create_archive(&ctx, &trunk, loc("m.txt"), b"a\nb\nc\n".to_vec(), "", None)
            .unwrap();
        p.checkin(&ctx, id, &feature, b"a\nB\nc\n".to_vec(), "").unwrap();
        p.checkin(&ctx, id, &trunk, b"a\nb\nc\nd\n".to_vec(), "").unwrap();

        let info = p.promotion_candidates(&feature).unwrap().remove(0);
        let result = p.promote(&ctx, &info, &NoWorkArea).unwrap();
        let PromoteOutcome::Merged { content, base, .. } = result.outcome else {
            panic!("expected merge, got {:?}", result.outcome);
        };
        assert_eq!(base, RevisionId::new("1.2").unwrap());
        assert_eq!(content, b"a\nB\nc\nd\n");
        p.checkin(&ctx, id, &trunk, content, "promoted").unwrap();

        let again = p.promote(&ctx, &info, &NoWorkArea).unwrap();
        assert_eq!(again.outcome, PromoteOutcome::AlreadyPromoted);
        assert!(p.promotion_candidates(&feature).unwrap().is_empty());

        let (_, feature_view) = p.fetch(id, &feature, &RevisionSelector::Default).unwrap();
        assert_eq!(feature_view, b"a\nB\nc\nd\n");
    }

    #[test]
    fn batch_stops_when_cancelled() {
        let (_t, p) = setup();
        let ctx = p.begin(user());
        let feature = b("feature");
        for name in ["a.txt", "b.txt"] {
            p.create_archive(&ctx, &feature, loc(name), b"x\n".to_vec(), "", None).unwrap();
        }
        let infos = p.promotion_candidates(&feature).unwrap();
        assert_eq!(infos.len(), 2);

        let cancel = AtomicBool::new(true);
        assert!(p.promote_batch(&ctx, &infos, &NoWorkArea, &cancel).is_empty());

        cancel.store(false, Ordering::SeqCst);
        let results = p.promote_batch(&ctx, &infos, &NoWorkArea, &cancel);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert!(p.find(&BranchName::trunk(), &loc("a.txt")).is_some());
    }
}

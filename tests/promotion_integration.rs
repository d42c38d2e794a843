//! Integration tests for promoting branch changes into parent branches.

use std::fs;

use tempfile::TempDir;

use branchvault::core::types::{ArchiveLocation, BranchName, FileId, RevisionId, UserName};
use branchvault::engine::{EngineError, Project, RevisionSelector};
use branchvault::promote::{DirWorkArea, NoWorkArea, PromoteError, PromoteOutcome, PromotionType};
use branchvault::txn::RequestContext;

// =============================================================================
// Test Fixtures
// =============================================================================

struct Fixture {
    _dir: TempDir,
    project: Project,
    ctx: RequestContext,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let project = Project::init(dir.path().join("vault"), None).expect("init");
        let ctx = project.begin(UserName::new("ann").unwrap());
        project
            .create_branch(&ctx, branch("b"), BranchName::trunk())
            .expect("branch");
        Self {
            _dir: dir,
            project,
            ctx,
        }
    }

    fn checkin(&self, id: FileId, on: &str, content: &str) -> RevisionId {
        self.project
            .checkin(&self.ctx, id, &branch(on), content.as_bytes().to_vec(), "")
            .expect("checkin")
    }

    fn content(&self, id: FileId, on: &str) -> String {
        let (_, bytes) = self
            .project
            .fetch(id, &branch(on), &RevisionSelector::Default)
            .expect("fetch");
        String::from_utf8(bytes).expect("utf8")
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.project.end(&self.ctx);
    }
}

fn branch(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

fn rev(id: &str) -> RevisionId {
    RevisionId::new(id).unwrap()
}

fn loc(path: &str) -> ArchiveLocation {
    ArchiveLocation::from_relative_path(path).unwrap()
}

const V1: &str = "alpha\nbeta\ngamma\ndelta\nepsilon\nzeta\n";
const V2: &str = "alpha\nbeta\ngamma\ndelta\nepsilon\nzeta\neta\n";
const V3: &str = "ALPHA\nbeta\ngamma\ndelta\nepsilon\nzeta\neta\n";

/// Trunk at 1.3 with the given history.
fn trunk_file(f: &Fixture) -> FileId {
    let id = f
        .project
        .create_archive(&f.ctx, &BranchName::trunk(), loc("doc/a.txt"), V1.as_bytes().to_vec(), "", None)
        .expect("create");
    f.checkin(id, "trunk", V2);
    assert_eq!(f.checkin(id, "trunk", V3), rev("1.3"));
    id
}

// =============================================================================
// Content promotion
// =============================================================================

#[test]
fn non_overlapping_edits_merge_onto_the_parent_tip() {
    let f = Fixture::new();
    let id = trunk_file(&f);

    // b edits gamma; trunk meanwhile edits epsilon twice
    let child = f.checkin(id, "b", "ALPHA\nbeta\nGAMMA\ndelta\nepsilon\nzeta\neta\n");
    assert_eq!(child, rev("1.3.1.1"));
    f.checkin(id, "trunk", "ALPHA\nbeta\ngamma\ndelta\nEpsilon\nzeta\neta\n");
    assert_eq!(
        f.checkin(id, "trunk", "ALPHA\nbeta\ngamma\ndelta\nEPSILON\nzeta\neta\n"),
        rev("1.5")
    );

    let info = f.project.promotion_candidates(&branch("b")).unwrap().remove(0);
    assert_eq!(info.promotion_type, PromotionType::Simple);
    assert_eq!(info.source_revision, Some(child));

    let result = f.project.promote(&f.ctx, &info, &NoWorkArea).expect("promote");
    let PromoteOutcome::Merged { content, base, .. } = result.outcome else {
        panic!("expected a clean merge, got {:?}", result.outcome);
    };
    assert_eq!(base, rev("1.5"));
    assert_eq!(
        String::from_utf8(content.clone()).unwrap(),
        "ALPHA\nbeta\nGAMMA\ndelta\nEPSILON\nzeta\neta\n"
    );

    let merged = f
        .project
        .checkin(&f.ctx, id, &BranchName::trunk(), content, "promoted")
        .expect("checkin merge");
    assert_eq!(merged, rev("1.6"));
    assert_eq!(f.content(id, "b"), f.content(id, "trunk"));
}

#[test]
fn overlapping_edits_conflict_and_advance_the_anchor() {
    let f = Fixture::new();
    let id = trunk_file(&f);

    f.checkin(id, "b", "ALPHA\nbeta\nchild\ndelta\nepsilon\nzeta\neta\n");
    f.checkin(id, "trunk", "ALPHA\nbeta\nparent\ndelta\nepsilon\nzeta\neta\n");
    f.checkin(id, "trunk", "ALPHA\nbeta\nparent\ndelta\nepsilon\nzeta\neta\ntheta\n");

    let info = f.project.promotion_candidates(&branch("b")).unwrap().remove(0);
    let result = f.project.promote(&f.ctx, &info, &NoWorkArea).expect("promote");
    match result.outcome {
        PromoteOutcome::Conflict {
            ancestor_id,
            parent_id,
            child_id,
            ancestor,
            child_tip,
            ..
        } => {
            assert_eq!(ancestor_id, rev("1.3"));
            assert_eq!(parent_id, rev("1.5"));
            assert_eq!(child_id, rev("1.3.1.1"));
            assert_eq!(ancestor, V3.as_bytes());
            assert!(String::from_utf8(child_tip).unwrap().contains("child"));
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    // b now follows trunk; its next edit forks from the parent's tip
    assert!(f.project.promotion_candidates(&branch("b")).unwrap().is_empty());
    assert_eq!(f.content(id, "b"), f.content(id, "trunk"));
    assert_eq!(
        f.checkin(id, "b", "resolved\n"),
        rev("1.5.1.1")
    );
}

// =============================================================================
// Structural promotion
// =============================================================================

#[test]
fn created_file_collides_with_uncontrolled_workfile() {
    let f = Fixture::new();
    let work = TempDir::new().expect("workdir");
    fs::write(work.path().join("foo.txt"), "mine\n").unwrap();

    let id = f
        .project
        .create_archive(&f.ctx, &branch("b"), loc("foo.txt"), b"from b\n".to_vec(), "", None)
        .expect("create");
    let info = f.project.promotion_candidates(&branch("b")).unwrap().remove(0);
    assert_eq!(info.promotion_type, PromotionType::FileCreated);

    let area = DirWorkArea::new(work.path(), BranchName::trunk());
    let result = f.project.promote(&f.ctx, &info, &area).expect("promote");
    match result.outcome {
        PromoteOutcome::Created {
            location,
            collision,
            content,
            ..
        } => {
            assert_eq!(location, loc("foo.txt-promoted"));
            assert_eq!(collision, Some(loc("foo.txt")));
            assert_eq!(content, b"from b\n");
        }
        other => panic!("expected create, got {other:?}"),
    }
    assert_eq!(f.project.find(&BranchName::trunk(), &loc("foo.txt-promoted")), Some(id));
    assert!(f.project.find(&BranchName::trunk(), &loc("foo.txt")).is_none());
}

#[test]
fn created_file_collides_with_controlled_file() {
    let f = Fixture::new();
    let id = f
        .project
        .create_archive(&f.ctx, &branch("b"), loc("dup.txt"), b"b\n".to_vec(), "", None)
        .expect("b file");
    // b's file is invisible on trunk, so trunk may claim the same location
    let trunk_id = f
        .project
        .create_archive(&f.ctx, &BranchName::trunk(), loc("dup.txt"), b"trunk\n".to_vec(), "", None)
        .expect("trunk file");
    assert_ne!(id, trunk_id);

    let info = f
        .project
        .promotion_candidates(&branch("b"))
        .unwrap()
        .into_iter()
        .find(|i| i.file_id == id)
        .expect("candidate");
    assert!(matches!(
        f.project.promote(&f.ctx, &info, &NoWorkArea),
        Err(EngineError::Promote(PromoteError::ControlledCollision { .. }))
    ));
    assert_eq!(f.project.find(&BranchName::trunk(), &loc("dup.txt")), Some(trunk_id));
}

#[test]
fn rename_and_delete_reach_trunk() {
    let f = Fixture::new();
    let trunk = BranchName::trunk();
    let renamed = f
        .project
        .create_archive(&f.ctx, &trunk, loc("src/old.rs"), b"r\n".to_vec(), "", None)
        .unwrap();
    let removed = f
        .project
        .create_archive(&f.ctx, &trunk, loc("src/gone.rs"), b"g\n".to_vec(), "", None)
        .unwrap();
    f.project.rename(&f.ctx, renamed, &branch("b"), "new.rs").unwrap();
    f.project.move_file(&f.ctx, renamed, &branch("b"), "lib").unwrap();
    f.project.delete(&f.ctx, removed, &branch("b")).unwrap();

    let infos = f.project.promotion_candidates(&branch("b")).unwrap();
    let kinds: Vec<PromotionType> = infos.iter().map(|i| i.promotion_type).collect();
    assert_eq!(kinds, vec![PromotionType::LocationAndNameDiffer, PromotionType::FileDeleted]);

    let cancel = std::sync::atomic::AtomicBool::new(false);
    for (_, result) in f.project.promote_batch(&f.ctx, &infos, &NoWorkArea, &cancel) {
        result.expect("promote");
    }
    assert_eq!(f.project.find(&trunk, &loc("lib/new.rs")), Some(renamed));
    assert!(f.project.find(&trunk, &loc("src/gone.rs")).is_none());
    assert_eq!(f.project.find_deleted(&trunk, &loc("src/gone.rs")), Some(removed));
    assert!(f.project.promotion_candidates(&branch("b")).unwrap().is_empty());
}

#[test]
fn grandchild_promotes_one_level_at_a_time() {
    let f = Fixture::new();
    f.project
        .create_branch(&f.ctx, branch("c"), branch("b"))
        .unwrap();
    let id = f
        .project
        .create_archive(&f.ctx, &branch("c"), loc("deep.txt"), b"c\n".to_vec(), "", None)
        .unwrap();

    // promoting c straight into trunk is refused
    let mut info = f.project.promotion_candidates(&branch("c")).unwrap().remove(0);
    let wrong = {
        let mut w = info.clone();
        w.target_branch = BranchName::trunk();
        w
    };
    assert!(matches!(
        f.project.promote(&f.ctx, &wrong, &NoWorkArea),
        Err(EngineError::Promote(PromoteError::NotParent { .. }))
    ));

    f.project.promote(&f.ctx, &info, &NoWorkArea).unwrap();
    assert!(f.project.find(&branch("b"), &loc("deep.txt")).is_some());
    assert!(f.project.find(&BranchName::trunk(), &loc("deep.txt")).is_none());

    info = f.project.promotion_candidates(&branch("b")).unwrap().remove(0);
    assert_eq!(info.promotion_type, PromotionType::FileCreated);
    f.project.promote(&f.ctx, &info, &NoWorkArea).unwrap();
    assert_eq!(f.project.find(&BranchName::trunk(), &loc("deep.txt")), Some(id));
}

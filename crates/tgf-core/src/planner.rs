use std::collections::HashSet;

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::{
    allocator::{FolderAllocator, FolderIdRange},
    artifacts::{record, record_text, ArtifactStore},
    domain::{FolderAllocation, FolderId, MembershipRule, OrganizationPlan, PlannedFolder, TopicGroup},
    errors::Error,
    inventory::ChatInventory,
    partition::{partition, Partition},
    plan::{truncate_title, validate_response, PlanLimits},
    ports::{ChatPlatform, Classifier},
    report::{FolderOutcome, FolderResult, OrganizationReport, PipelineFailure, PipelineStage},
};

/// Knobs the planner needs from config.
#[derive(Clone, Debug)]
pub struct PlannerSettings {
    pub limits: PlanLimits,
    pub id_range: FolderIdRange,
    pub personal_title: String,
    pub bots_title: String,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            limits: PlanLimits::default(),
            id_range: FolderIdRange::default(),
            personal_title: "Personal".to_string(),
            bots_title: "Bots".to_string(),
        }
    }
}

type StageResult<T> = std::result::Result<T, PipelineFailure>;

/// Drives one organization run: fetch, partition, classify, validate, allocate, report.
///
/// Runs are strictly sequential; callers must not start two runs against the
/// same account at once.
pub struct OrganizationPlanner<'a> {
    platform: &'a dyn ChatPlatform,
    classifier: &'a dyn Classifier,
    artifacts: &'a dyn ArtifactStore,
    settings: &'a PlannerSettings,
    stage: PipelineStage,
}

impl<'a> OrganizationPlanner<'a> {
    pub fn new(
        platform: &'a dyn ChatPlatform,
        classifier: &'a dyn Classifier,
        artifacts: &'a dyn ArtifactStore,
        settings: &'a PlannerSettings,
    ) -> Self {
        Self {
            platform,
            classifier,
            artifacts,
            settings,
            stage: PipelineStage::Fetching,
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Run with a fresh allocator over the configured id range.
    pub async fn run(&mut self) -> StageResult<OrganizationReport> {
        let allocator = FolderAllocator::new(
            self.settings.id_range,
            self.settings.limits.folder_title_max_chars,
        );
        self.run_with(allocator).await
    }

    /// Run with a caller-supplied allocator; it is consumed so ids never leak across runs.
    pub async fn run_with<R: Rng + Send>(
        &mut self,
        allocator: FolderAllocator<R>,
    ) -> StageResult<OrganizationReport> {
        let res = self.drive(allocator).await;
        if let Err(e) = self.artifacts.cleanup() {
            warn!(error = %e, "artifact cleanup failed");
        }
        match &res {
            Ok(_) => self.enter(PipelineStage::Done),
            Err(f) => {
                error!(stage = %f.stage, error = %f.error, "organization run failed");
                self.stage = PipelineStage::Failed;
            }
        }
        res
    }

    async fn drive<R: Rng + Send>(
        &mut self,
        mut allocator: FolderAllocator<R>,
    ) -> StageResult<OrganizationReport> {
        self.enter(PipelineStage::Fetching);
        let records = ChatInventory::new(self.platform)
            .fetch_all()
            .await
            .map_err(|e| self.fail(e))?;

        self.enter(PipelineStage::Partitioning);
        let buckets = partition(records);
        info!(
            groups_channels = buckets.group_channel.len(),
            private = buckets.private.len(),
            bots = buckets.bots.len(),
            "dialogs partitioned"
        );
        record(self.artifacts, "group_channel_chats.json", &buckets.group_channel);
        record(self.artifacts, "private_chats.json", &buckets.private);
        record(self.artifacts, "bot_chats.json", &buckets.bots);

        self.enter(PipelineStage::Classifying);
        let raw = self.classify(&buckets).await.map_err(|e| self.fail(e))?;
        record_text(self.artifacts, "ai_categorized_chats.json", &raw);

        self.enter(PipelineStage::ValidatingPlan);
        let topics = validate_response(&raw, &buckets.group_channel, &self.settings.limits)
            .map_err(|e| self.fail(e))?;
        let plan = self.build_plan(topics, &buckets);
        record(self.artifacts, "plan.json", &plan);

        self.enter(PipelineStage::Allocating);
        let report = self.allocate(&plan, &mut allocator).await;

        self.enter(PipelineStage::Reporting);
        info!(
            created = report.created().count(),
            failed = report.not_created().count(),
            "organization run finished"
        );
        Ok(report)
    }

    async fn classify(&self, buckets: &Partition) -> crate::Result<String> {
        if buckets.group_channel.is_empty() {
            info!("no groups or channels; skipping classifier");
            return Ok("[]".to_string());
        }
        self.classifier
            .classify(&buckets.group_channel)
            .await
            .map_err(|e| match e {
                Error::Classification(_) => e,
                other => Error::Classification(other.to_string()),
            })
    }

    fn build_plan(&self, topics: Vec<TopicGroup>, buckets: &Partition) -> OrganizationPlan {
        OrganizationPlan::new(
            topics,
            &self.settings.personal_title,
            buckets.private.len(),
            &self.settings.bots_title,
            buckets.bots.len(),
        )
    }

    async fn allocate<R: Rng + Send>(
        &self,
        plan: &OrganizationPlan,
        allocator: &mut FolderAllocator<R>,
    ) -> OrganizationReport {
        let existing = match self.platform.existing_folders().await {
            Ok(folders) => folders,
            Err(e) => {
                warn!(error = %e, "could not list existing folders; ids may collide");
                Vec::new()
            }
        };
        allocator.reserve(existing.iter().map(|f| f.folder_id.0));
        let mut claimed = HashSet::new();

        let mut report = OrganizationReport::default();
        for folder in &plan.folders {
            let outcome = |result| FolderOutcome {
                title: folder.title.clone(),
                chat_count: folder.chat_count,
                rule: folder.rule.clone(),
                result,
            };

            let reuse = self.find_reusable(&existing, &claimed, folder);
            if let (None, Some(reason)) = (reuse, &report.aborted) {
                report
                    .outcomes
                    .push(outcome(FolderResult::Skipped(reason.clone())));
                continue;
            }
            if let Some(id) = reuse {
                claimed.insert(id);
                debug!(folder_id = %id, title = %folder.title, "reusing existing folder");
            }

            match allocator
                .ensure_folder(self.platform, reuse, &folder.title, folder.rule.clone())
                .await
            {
                Ok(created) => report.outcomes.push(FolderOutcome {
                    title: created.title,
                    ..outcome(FolderResult::Created(created.folder_id))
                }),
                Err(e @ Error::Capacity { .. }) => {
                    error!(title = %folder.title, error = %e, "folder ids exhausted");
                    report.aborted = Some(e.to_string());
                    report
                        .outcomes
                        .push(outcome(FolderResult::Skipped(e.to_string())));
                }
                Err(e) => {
                    warn!(title = %folder.title, error = %e, "folder creation failed");
                    report.outcomes.push(outcome(FolderResult::Failed(e.to_string())));
                }
            }
        }
        report
    }

    /// Folder from an earlier run that this planned folder should overwrite.
    /// Categorical folders match on their rule, topic folders on their title.
    fn find_reusable(
        &self,
        existing: &[FolderAllocation],
        claimed: &HashSet<FolderId>,
        folder: &PlannedFolder,
    ) -> Option<FolderId> {
        let title = truncate_title(&folder.title, self.settings.limits.folder_title_max_chars);
        existing
            .iter()
            .filter(|f| !claimed.contains(&f.folder_id))
            .find(|f| match (&folder.rule, &f.membership_rule) {
                (MembershipRule::Chats { .. }, MembershipRule::Chats { .. }) => f.title == title,
                (planned, current) => planned == current,
            })
            .map(|f| f.folder_id)
    }

    fn enter(&mut self, stage: PipelineStage) {
        self.stage = stage;
        info!(stage = %stage, "pipeline stage");
    }

    fn fail(&self, error: Error) -> PipelineFailure {
        PipelineFailure {
            stage: self.stage,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{DirArtifactStore, NoopArtifactStore};
    use crate::domain::{ChatId, ChatRecord};
    use crate::snapshot::SnapshotPlatform;
    use crate::ports::{RawChat, RawDialog};
    use crate::Result;
    use async_trait::async_trait;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn dialog(id: i64, tag: &str, title: &str) -> RawDialog {
        RawDialog {
            chat: RawChat {
                id,
                kind_tag: tag.into(),
                title: Some(title.into()),
                ..Default::default()
            },
            top_message: None,
        }
    }

    #[derive(Default)]
    struct FakePlatform {
        dialogs: Vec<RawDialog>,
        fetch_error: bool,
        reject_titles: Vec<String>,
        existing: Vec<FolderAllocation>,
        folders: Mutex<Vec<FolderAllocation>>,
    }

    impl FakePlatform {
        fn with_dialogs(dialogs: Vec<RawDialog>) -> Self {
            Self {
                dialogs,
                ..Default::default()
            }
        }

        fn folders(&self) -> Vec<FolderAllocation> {
            self.folders.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatPlatform for FakePlatform {
        async fn fetch_dialogs(&self) -> Result<Vec<RawDialog>> {
            if self.fetch_error {
                return Err(Error::Transport("AUTH_KEY_UNREGISTERED".into()));
            }
            Ok(self.dialogs.clone())
        }

        async fn update_folder(&self, folder: &FolderAllocation) -> Result<()> {
            if self.reject_titles.contains(&folder.title) {
                return Err(Error::Platform("FILTER_INCLUDE_INVALID".into()));
            }
            let mut folders = self.folders.lock().unwrap();
            match folders.iter_mut().find(|f| f.folder_id == folder.folder_id) {
                Some(current) => *current = folder.clone(),
                None => folders.push(folder.clone()),
            }
            Ok(())
        }

        async fn existing_folders(&self) -> Result<Vec<FolderAllocation>> {
            let mut all = self.existing.clone();
            all.extend(self.folders());
            Ok(all)
        }
    }

    struct FakeClassifier {
        response: std::result::Result<String, String>,
        calls: AtomicUsize,
    }

    impl FakeClassifier {
        fn ok(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                response: Err(msg.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Classifier for FakeClassifier {
        async fn classify(&self, _chats: &[ChatRecord]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map_err(Error::External)
        }
    }

    fn seeded(settings: &PlannerSettings, seed: u64) -> FolderAllocator<StdRng> {
        FolderAllocator::with_rng(
            settings.id_range,
            settings.limits.folder_title_max_chars,
            StdRng::seed_from_u64(seed),
        )
    }

    fn sample_dialogs() -> Vec<RawDialog> {
        vec![
            dialog(-100, "CHANNEL", "NewsX"),
            dialog(-200, "GROUP", "DevTeam"),
            dialog(7, "PRIVATE", "Alice"),
            dialog(8, "PRIVATE", "Bob"),
            dialog(9, "BOT", "helper_bot"),
        ]
    }

    const TWO_TOPICS: &str = r#"[{"topic":"📰 News","chats":[{"chat_id":-100}]},{"topic":"💻 Dev","chats":[{"chat_id":-200}]}]"#;

    #[tokio::test]
    async fn end_to_end_creates_topic_and_categorical_folders() {
        let platform = FakePlatform::with_dialogs(sample_dialogs());
        let classifier = FakeClassifier::ok(TWO_TOPICS);
        let settings = PlannerSettings::default();
        let mut planner =
            OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings);

        let report = planner.run_with(seeded(&settings, 1)).await.unwrap();
        assert_eq!(planner.stage(), PipelineStage::Done);
        assert!(report.is_complete());

        let folders = platform.folders();
        let titles: Vec<&str> = folders.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["📰 News", "💻 Dev", "Personal", "Bots"]);
        assert_eq!(
            folders[0].membership_rule,
            MembershipRule::Chats {
                chat_ids: vec![ChatId(-100)]
            }
        );
        assert_eq!(folders[2].membership_rule, MembershipRule::AllPrivate);
        assert_eq!(folders[3].membership_rule, MembershipRule::AllBots);

        let mut ids: Vec<i32> = folders.iter().map(|f| f.folder_id.0).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);

        let text = report.render();
        for line in [
            "- 📰 News (1 chats)",
            "- 💻 Dev (1 chats)",
            "- Personal (2 chats)",
            "- Bots (1 chats)",
        ] {
            assert!(text.contains(line), "missing {line} in {text}");
        }
    }

    #[tokio::test]
    async fn long_topic_labels_are_truncated_on_creation() {
        let platform = FakePlatform::with_dialogs(sample_dialogs());
        let classifier = FakeClassifier::ok(
            r#"[{"topic":"📰 World News Today","chats":[{"chat_id":-100}]}]"#,
        );
        let settings = PlannerSettings::default();
        let mut planner =
            OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings);
        let report = planner.run_with(seeded(&settings, 2)).await.unwrap();
        assert_eq!(platform.folders()[0].title, "📰 World News");
        assert_eq!(report.outcomes[0].title, "📰 World News");
    }

    #[tokio::test]
    async fn unknown_member_fails_validation_without_creating_folders() {
        let platform = FakePlatform::with_dialogs(vec![
            dialog(1, "GROUP", "a"),
            dialog(2, "GROUP", "b"),
            dialog(3, "CHANNEL", "c"),
        ]);
        let classifier = FakeClassifier::ok(r#"[{"topic":"x","chats":[{"chat_id":4}]}]"#);
        let settings = PlannerSettings::default();
        let mut planner =
            OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings);

        let failure = planner.run_with(seeded(&settings, 3)).await.unwrap_err();
        assert_eq!(failure.stage, PipelineStage::ValidatingPlan);
        assert!(matches!(failure.error, Error::Classification(_)));
        assert_eq!(planner.stage(), PipelineStage::Failed);
        assert!(platform.folders().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_aborts_before_classification() {
        let platform = FakePlatform {
            fetch_error: true,
            ..Default::default()
        };
        let classifier = FakeClassifier::ok("[]");
        let settings = PlannerSettings::default();
        let mut planner =
            OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings);

        let failure = planner.run().await.unwrap_err();
        assert_eq!(failure.stage, PipelineStage::Fetching);
        assert!(matches!(failure.error, Error::Transport(_)));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert!(platform.folders().is_empty());
    }

    #[tokio::test]
    async fn classifier_failure_is_a_classification_error() {
        let platform = FakePlatform::with_dialogs(sample_dialogs());
        let classifier = FakeClassifier::failing("503 Service Unavailable");
        let settings = PlannerSettings::default();
        let mut planner =
            OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings);

        let failure = planner.run().await.unwrap_err();
        assert_eq!(failure.stage, PipelineStage::Classifying);
        assert!(matches!(failure.error, Error::Classification(_)));
        assert!(failure.render().contains("503 Service Unavailable"));
        assert!(platform.folders().is_empty());
    }

    #[tokio::test]
    async fn one_rejected_folder_does_not_stop_the_others() {
        let platform = FakePlatform {
            dialogs: vec![
                dialog(-1, "GROUP", "a"),
                dialog(-2, "GROUP", "b"),
                dialog(-3, "GROUP", "c"),
            ],
            reject_titles: vec!["Two".into()],
            ..Default::default()
        };
        let classifier = FakeClassifier::ok(
            r#"[{"topic":"One","chats":[{"chat_id":-1}]},
                {"topic":"Two","chats":[{"chat_id":-2}]},
                {"topic":"Three","chats":[{"chat_id":-3}]}]"#,
        );
        let settings = PlannerSettings::default();
        let mut planner =
            OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings);

        let report = planner.run_with(seeded(&settings, 4)).await.unwrap();
        assert_eq!(planner.stage(), PipelineStage::Done);
        assert!(!report.is_complete());

        let created: Vec<&str> = report.created().map(|o| o.title.as_str()).collect();
        assert_eq!(created, vec!["One", "Three", "Personal", "Bots"]);
        let failed: Vec<&FolderOutcome> = report.not_created().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].title, "Two");
        assert!(matches!(failed[0].result, FolderResult::Failed(_)));
        assert!(report.render().contains("❌ Failed:\n- Two: platform error"));
    }

    #[tokio::test]
    async fn capacity_exhaustion_keeps_created_folders_and_skips_the_rest() {
        let platform = FakePlatform::with_dialogs(sample_dialogs());
        let classifier = FakeClassifier::ok(TWO_TOPICS);
        let settings = PlannerSettings {
            id_range: FolderIdRange::new(1, 2).unwrap(),
            ..PlannerSettings::default()
        };
        let mut planner =
            OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings);

        let report = planner.run_with(seeded(&settings, 5)).await.unwrap();
        assert_eq!(platform.folders().len(), 2);
        assert_eq!(report.created().count(), 2);
        assert!(report.aborted.is_some());
        assert!(report.outcomes[2..]
            .iter()
            .all(|o| matches!(o.result, FolderResult::Skipped(_))));
    }

    fn user_folder(id: i32, title: &str) -> FolderAllocation {
        FolderAllocation {
            folder_id: FolderId(id),
            title: title.into(),
            membership_rule: MembershipRule::Chats {
                chat_ids: vec![ChatId(-999)],
            },
        }
    }

    #[tokio::test]
    async fn foreign_folder_ids_are_not_reused() {
        let platform = FakePlatform {
            dialogs: sample_dialogs(),
            existing: vec![user_folder(1, "Work"), user_folder(2, "Family")],
            ..Default::default()
        };
        let classifier = FakeClassifier::ok("[]");
        let settings = PlannerSettings {
            id_range: FolderIdRange::new(1, 4).unwrap(),
            ..PlannerSettings::default()
        };
        let mut planner =
            OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings);

        planner.run_with(seeded(&settings, 6)).await.unwrap();
        let mut ids: Vec<i32> = platform.folders().iter().map(|f| f.folder_id.0).collect();
        ids.sort();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn categorical_folders_are_equivalent_across_runs() {
        let settings = PlannerSettings::default();
        let classifier = FakeClassifier::ok(TWO_TOPICS);

        let mut runs = Vec::new();
        for seed in [10, 11] {
            let platform = FakePlatform::with_dialogs(sample_dialogs());
            let mut planner =
                OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings);
            planner.run_with(seeded(&settings, seed)).await.unwrap();
            runs.push(platform.folders());
        }

        let categorical = |folders: &[FolderAllocation]| {
            folders
                .iter()
                .filter(|f| !matches!(f.membership_rule, MembershipRule::Chats { .. }))
                .map(|f| (f.title.clone(), f.membership_rule.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(categorical(&runs[0]), categorical(&runs[1]));
        assert_eq!(categorical(&runs[0]).len(), 2);
    }

    #[tokio::test]
    async fn rerun_overwrites_the_folders_of_the_previous_run() {
        let platform = FakePlatform {
            dialogs: sample_dialogs(),
            existing: vec![user_folder(50, "Work")],
            ..Default::default()
        };
        let classifier = FakeClassifier::ok(TWO_TOPICS);
        let settings = PlannerSettings::default();

        let ids = |folders: &[FolderAllocation]| {
            let mut ids: Vec<i32> = folders.iter().map(|f| f.folder_id.0).collect();
            ids.sort();
            ids
        };

        OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings)
            .run_with(seeded(&settings, 20))
            .await
            .unwrap();
        let first = platform.folders();
        assert_eq!(first.len(), 4);
        assert!(first.iter().all(|f| f.folder_id != FolderId(50)));

        OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings)
            .run_with(seeded(&settings, 21))
            .await
            .unwrap();
        let second = platform.folders();
        assert_eq!(ids(&second), ids(&first));

        let count = |rule: MembershipRule| {
            second.iter().filter(|f| f.membership_rule == rule).count()
        };
        assert_eq!(count(MembershipRule::AllPrivate), 1);
        assert_eq!(count(MembershipRule::AllBots), 1);
    }

    #[tokio::test]
    async fn topic_folder_keeps_its_id_when_members_change() {
        let platform = FakePlatform::with_dialogs(sample_dialogs());
        let settings = PlannerSettings::default();

        let first = FakeClassifier::ok(TWO_TOPICS);
        OrganizationPlanner::new(&platform, &first, &NoopArtifactStore, &settings)
            .run_with(seeded(&settings, 22))
            .await
            .unwrap();
        let before = platform.folders();

        let second = FakeClassifier::ok(
            r#"[{"topic":"📰 News","chats":[{"chat_id":-100},{"chat_id":-200}]}]"#,
        );
        OrganizationPlanner::new(&platform, &second, &NoopArtifactStore, &settings)
            .run_with(seeded(&settings, 23))
            .await
            .unwrap();
        let after = platform.folders();

        assert_eq!(after.len(), 4);
        let news = after.iter().find(|f| f.title == "📰 News").unwrap();
        assert_eq!(news.folder_id, before[0].folder_id);
        assert_eq!(
            news.membership_rule,
            MembershipRule::Chats {
                chat_ids: vec![ChatId(-100), ChatId(-200)]
            }
        );
    }

    #[tokio::test]
    async fn repeated_runs_on_a_snapshot_never_exhaust_folder_ids() {
        let dir = tempfile::tempdir().unwrap();
        let dialogs = dir.path().join("dialogs.json");
        std::fs::write(
            &dialogs,
            r#"[{"chat": {"id": -100, "type": "CHANNEL", "title": "NewsX"}},
                {"chat": {"id": 7, "type": "PRIVATE"}},
                {"chat": {"id": 9, "type": "BOT"}}]"#,
        )
        .unwrap();
        let platform = SnapshotPlatform::new(&dialogs, dir.path().join("folders.json"));
        let classifier = FakeClassifier::ok(r#"[{"topic":"📰 News","chats":[{"chat_id":-100}]}]"#);
        let settings = PlannerSettings::default();

        for seed in 0..30 {
            let report =
                OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings)
                    .run_with(seeded(&settings, seed))
                    .await
                    .unwrap();
            assert!(report.is_complete(), "run {seed}: {}", report.render());
        }

        let folders = platform.existing_folders().await.unwrap();
        assert_eq!(folders.len(), 3);
        let titles: Vec<&str> = folders.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles.iter().filter(|t| **t == "Personal").count(), 1);
        assert_eq!(titles.iter().filter(|t| **t == "Bots").count(), 1);
    }

    #[tokio::test]
    async fn empty_group_bucket_skips_classifier() {
        let platform = FakePlatform::with_dialogs(vec![dialog(7, "PRIVATE", "Alice")]);
        let classifier = FakeClassifier::failing("must not be called");
        let settings = PlannerSettings::default();
        let mut planner =
            OrganizationPlanner::new(&platform, &classifier, &NoopArtifactStore, &settings);

        let report = planner.run().await.unwrap();
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn artifacts_are_cleaned_up_after_success_and_failure() {
        let root = tempfile::tempdir().unwrap();
        let settings = PlannerSettings::default();

        let platform = FakePlatform::with_dialogs(sample_dialogs());
        let classifier = FakeClassifier::ok(TWO_TOPICS);
        let store = DirArtifactStore::for_run(root.path(), false);
        OrganizationPlanner::new(&platform, &classifier, &store, &settings)
            .run()
            .await
            .unwrap();
        assert!(!store.dir().exists());

        let bad = FakeClassifier::ok("not json");
        let store = DirArtifactStore::for_run(root.path(), true);
        OrganizationPlanner::new(&platform, &bad, &store, &settings)
            .run()
            .await
            .unwrap_err();
        assert!(store.dir().join("group_channel_chats.json").exists());
        assert!(store.dir().join("ai_categorized_chats.json").exists());
        assert!(!store.dir().join("plan.json").exists());
    }
}

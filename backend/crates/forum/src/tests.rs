//! Workflow tests for the forum crate, run against the in-memory store

#[cfg(test)]
mod fixtures {
    use std::sync::Arc;

    use kernel::id::UserId;

    use crate::application::config::ForumConfig;
    use crate::application::create_problem::{CreateProblemInput, CreateProblemUseCase};
    use crate::application::submit_solution::{SubmitSolutionInput, SubmitSolutionUseCase};
    use crate::domain::entities::{Problem, Solution};
    use crate::infra::memory::MemoryForumStore;

    pub fn store() -> Arc<MemoryForumStore> {
        Arc::new(MemoryForumStore::new())
    }

    pub fn config() -> Arc<ForumConfig> {
        Arc::new(ForumConfig::default())
    }

    pub fn member(store: &MemoryForumStore) -> UserId {
        let user_id = UserId::new();
        let user_name = format!("member_{}", &user_id.to_string()[..8]);
        store.insert_member(user_id, &user_name);
        user_id
    }

    pub fn problem_input(title: &str) -> CreateProblemInput {
        CreateProblemInput {
            title: title.to_string(),
            description: "Water pools at the crossing after every rain".to_string(),
            location: "Elm St & 3rd Ave".to_string(),
            category: "infrastructure".to_string(),
            urgency: None,
            images: vec![],
        }
    }

    pub async fn problem(store: &Arc<MemoryForumStore>, owner: UserId) -> Problem {
        CreateProblemUseCase::new(store.clone(), config())
            .execute(problem_input("Flooded crossing"), owner)
            .await
            .unwrap()
    }

    pub async fn solution(
        store: &Arc<MemoryForumStore>,
        problem: &Problem,
        author: UserId,
    ) -> Solution {
        SubmitSolutionUseCase::new(store.clone(), store.clone(), store.clone(), config())
            .execute(
                SubmitSolutionInput {
                    problem_id: problem.id,
                    description: "Add a storm drain on the north corner".to_string(),
                },
                author,
            )
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod upvote_tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use kernel::id::{ProblemId, UserId};
    use proptest::prelude::*;
    use tokio::sync::Barrier;

    use super::fixtures;
    use crate::application::toggle_upvote::{ToggleUpvoteOutput, ToggleUpvoteUseCase};
    use crate::domain::repository::{
        ProblemRepository, SolutionRepository, UpvoteChange, UpvoteRepository,
    };
    use crate::domain::value_objects::UpvoteTarget;
    use crate::error::{ForumError, ForumResult};
    use crate::infra::memory::MemoryForumStore;

    fn toggler(store: &Arc<MemoryForumStore>) -> ToggleUpvoteUseCase<MemoryForumStore> {
        ToggleUpvoteUseCase::new(store.clone())
    }

    /// Holds every `has_upvote` caller until `parties` of them have read, so
    /// concurrent toggles all act on the same stale membership
    struct LockstepStore {
        inner: Arc<MemoryForumStore>,
        barrier: Barrier,
    }

    impl LockstepStore {
        fn new(inner: Arc<MemoryForumStore>, parties: usize) -> Arc<Self> {
            Arc::new(Self {
                inner,
                barrier: Barrier::new(parties),
            })
        }
    }

    impl UpvoteRepository for LockstepStore {
        async fn has_upvote(&self, target: UpvoteTarget, user_id: &UserId) -> ForumResult<bool> {
            let seen = self.inner.has_upvote(target, user_id).await;
            self.barrier.wait().await;
            seen
        }

        async fn add_upvote(
            &self,
            target: UpvoteTarget,
            user_id: &UserId,
        ) -> ForumResult<UpvoteChange> {
            self.inner.add_upvote(target, user_id).await
        }

        async fn remove_upvote(
            &self,
            target: UpvoteTarget,
            user_id: &UserId,
        ) -> ForumResult<UpvoteChange> {
            self.inner.remove_upvote(target, user_id).await
        }
    }

    async fn assert_count_matches_membership(
        store: &MemoryForumStore,
        problem_id: &ProblemId,
        voter: &UserId,
    ) {
        let member = store
            .has_upvote(UpvoteTarget::Problem(*problem_id), voter)
            .await
            .unwrap();
        let stored = store.get_problem(problem_id).await.unwrap().unwrap();
        assert_eq!(stored.upvote_count, i64::from(member));
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let voter = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let target = UpvoteTarget::Problem(problem.id);

        let first = toggler(&store).execute(target, voter).await.unwrap();
        assert!(first.has_upvoted);
        assert_eq!(first.upvote_count, 1);

        let second = toggler(&store).execute(target, voter).await.unwrap();
        assert!(!second.has_upvoted);
        assert_eq!(second.upvote_count, 0);

        let stored = store.get_problem(&problem.id).await.unwrap().unwrap();
        assert_eq!(stored.upvote_count, 0);
    }

    #[tokio::test]
    async fn test_toggle_solution_counts_distinct_users() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let solution = fixtures::solution(&store, &problem, owner).await;
        let target = UpvoteTarget::Solution(solution.id);

        for _ in 0..3 {
            let voter = fixtures::member(&store);
            toggler(&store).execute(target, voter).await.unwrap();
        }

        let stored = store.get_solution(&solution.id).await.unwrap().unwrap();
        assert_eq!(stored.upvote_count, 3);

        // Problem counter is untouched by solution upvotes
        let problem = store.get_problem(&problem.id).await.unwrap().unwrap();
        assert_eq!(problem.upvote_count, 0);
    }

    #[tokio::test]
    async fn test_toggle_missing_target_writes_nothing() {
        let store = fixtures::store();
        let voter = fixtures::member(&store);

        let err = toggler(&store)
            .execute(UpvoteTarget::Problem(ProblemId::new()), voter)
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::ProblemNotFound));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_lose_no_updates() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let target = UpvoteTarget::Problem(problem.id);

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let voter = UserId::new();
                    toggler(&store).execute(target, voter).await.unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().has_upvoted);
        }

        let stored = store.get_problem(&problem.id).await.unwrap().unwrap();
        assert_eq!(stored.upvote_count, 64);
    }

    #[tokio::test]
    async fn test_interleaved_set_changes_keep_count_in_step() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let voter = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let target = UpvoteTarget::Problem(problem.id);

        // Two toggles that both read "not upvoted" before either writes
        assert!(!store.has_upvote(target, &voter).await.unwrap());
        assert!(!store.has_upvote(target, &voter).await.unwrap());
        let first = store.add_upvote(target, &voter).await.unwrap();
        let second = store.add_upvote(target, &voter).await.unwrap();
        assert_eq!(
            first,
            UpvoteChange {
                upvote_count: 1,
                changed: true
            }
        );
        assert_eq!(
            second,
            UpvoteChange {
                upvote_count: 1,
                changed: false
            }
        );
        assert_count_matches_membership(&store, &problem.id, &voter).await;

        // Then two that both read "upvoted"
        assert!(store.has_upvote(target, &voter).await.unwrap());
        assert!(store.has_upvote(target, &voter).await.unwrap());
        let first = store.remove_upvote(target, &voter).await.unwrap();
        let second = store.remove_upvote(target, &voter).await.unwrap();
        assert_eq!(
            first,
            UpvoteChange {
                upvote_count: 0,
                changed: true
            }
        );
        assert_eq!(
            second,
            UpvoteChange {
                upvote_count: 0,
                changed: false
            }
        );
        assert_count_matches_membership(&store, &problem.id, &voter).await;

        // A remove racing ahead of an add for the same click pair
        store.add_upvote(target, &voter).await.unwrap();
        store.remove_upvote(target, &voter).await.unwrap();
        store.remove_upvote(target, &voter).await.unwrap();
        store.add_upvote(target, &voter).await.unwrap();
        assert_count_matches_membership(&store, &problem.id, &voter).await;
        let stored = store.get_problem(&problem.id).await.unwrap().unwrap();
        assert_eq!(stored.upvote_count, 1);
    }

    #[tokio::test]
    async fn test_double_click_on_stale_read_counts_once() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let voter = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let target = UpvoteTarget::Problem(problem.id);

        let lockstep = LockstepStore::new(store.clone(), 2);
        let use_case = ToggleUpvoteUseCase::new(lockstep);
        let (first, second) = tokio::join!(
            use_case.execute(target, voter),
            use_case.execute(target, voter)
        );

        // Both read "not upvoted", so both meant to add; only one insert lands
        let expected = ToggleUpvoteOutput {
            upvote_count: 1,
            has_upvoted: true,
        };
        assert_eq!(first.unwrap(), expected);
        assert_eq!(second.unwrap(), expected);
        assert_count_matches_membership(&store, &problem.id, &voter).await;

        // And the mirror image on the way back down
        let (first, second) = tokio::join!(
            use_case.execute(target, voter),
            use_case.execute(target, voter)
        );
        let expected = ToggleUpvoteOutput {
            upvote_count: 0,
            has_upvoted: false,
        };
        assert_eq!(first.unwrap(), expected);
        assert_eq!(second.unwrap(), expected);
        assert_count_matches_membership(&store, &problem.id, &voter).await;
    }

    #[tokio::test]
    async fn test_stale_reads_across_solution_upvoters() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let solution = fixtures::solution(&store, &problem, owner).await;
        let target = UpvoteTarget::Solution(solution.id);
        let voters: Vec<UserId> = (0..3).map(|_| fixtures::member(&store)).collect();

        let use_case = ToggleUpvoteUseCase::new(LockstepStore::new(store.clone(), 3));
        let (a, b, c) = tokio::join!(
            use_case.execute(target, voters[0]),
            use_case.execute(target, voters[1]),
            use_case.execute(target, voters[2])
        );

        let mut counts = vec![
            a.unwrap().upvote_count,
            b.unwrap().upvote_count,
            c.unwrap().upvote_count,
        ];
        counts.sort();
        assert_eq!(counts, vec![1, 2, 3]);

        let stored = store.get_solution(&solution.id).await.unwrap().unwrap();
        assert_eq!(stored.upvote_count, 3);
    }

    proptest! {
        #[test]
        fn prop_count_matches_membership(voters in prop::collection::vec(0usize..5, 1..40)) {
            tokio_test::block_on(async {
                let store = fixtures::store();
                let owner = fixtures::member(&store);
                let users: Vec<UserId> = (0..5).map(|_| fixtures::member(&store)).collect();
                let problem = fixtures::problem(&store, owner).await;
                let target = UpvoteTarget::Problem(problem.id);

                let mut model: HashSet<UserId> = HashSet::new();
                for index in voters {
                    let user = users[index];
                    let output = toggler(&store).execute(target, user).await.unwrap();

                    let expected = if model.contains(&user) {
                        model.remove(&user);
                        false
                    } else {
                        model.insert(user);
                        true
                    };
                    prop_assert_eq!(output.has_upvoted, expected);
                    prop_assert_eq!(output.upvote_count, model.len() as i64);
                }
                Ok(())
            })?;
        }
    }
}

#[cfg(test)]
mod submission_tests {
    use kernel::id::ProblemId;

    use super::fixtures;
    use crate::application::submit_solution::{SubmitSolutionInput, SubmitSolutionUseCase};
    use crate::domain::repository::{MemberRepository, ProblemRepository, SolutionRepository};
    use crate::error::ForumError;

    #[tokio::test]
    async fn test_submission_updates_counters() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let author = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;

        let solution = fixtures::solution(&store, &problem, author).await;
        fixtures::solution(&store, &problem, author).await;

        assert!(!solution.is_accepted);
        assert_eq!(solution.upvote_count, 0);
        assert_eq!(solution.proposed_by, author);

        let problem = store.get_problem(&problem.id).await.unwrap().unwrap();
        assert_eq!(problem.solution_count, 2);
        assert_eq!(
            store.list_solutions(&problem.id).await.unwrap().len() as i64,
            problem.solution_count
        );

        let member = store.get_member(&author).await.unwrap().unwrap();
        assert_eq!(member.solutions_provided, 2);
    }

    #[tokio::test]
    async fn test_submission_to_missing_problem() {
        let store = fixtures::store();
        let author = fixtures::member(&store);
        let use_case = SubmitSolutionUseCase::new(
            store.clone(),
            store.clone(),
            store.clone(),
            fixtures::config(),
        );

        let err = use_case
            .execute(
                SubmitSolutionInput {
                    problem_id: ProblemId::new(),
                    description: "Anything".to_string(),
                },
                author,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ForumError::ProblemNotFound));
        let member = store.get_member(&author).await.unwrap().unwrap();
        assert_eq!(member.solutions_provided, 0);
    }

    #[tokio::test]
    async fn test_submission_validates_description() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let use_case = SubmitSolutionUseCase::new(
            store.clone(),
            store.clone(),
            store.clone(),
            fixtures::config(),
        );

        for description in ["   ".to_string(), "x".repeat(2001)] {
            let err = use_case
                .execute(
                    SubmitSolutionInput {
                        problem_id: problem.id,
                        description,
                    },
                    owner,
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ForumError::Validation(_)));
        }

        assert!(store.list_solutions(&problem.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reputation_failure_keeps_solution() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;

        // Author has no member record, so the reputation delta fails
        let stranger = kernel::id::UserId::new();
        let solution = fixtures::solution(&store, &problem, stranger).await;

        assert!(store.get_solution(&solution.id).await.unwrap().is_some());
        let problem = store.get_problem(&problem.id).await.unwrap().unwrap();
        assert_eq!(problem.solution_count, 1);
    }
}

#[cfg(test)]
mod acceptance_tests {
    use std::sync::Arc;

    use kernel::id::{SolutionId, UserId};

    use super::fixtures;
    use crate::application::accept_solution::AcceptSolutionUseCase;
    use crate::domain::entities::Solution;
    use crate::domain::repository::{MemberRepository, ProblemRepository, SolutionRepository};
    use crate::domain::value_objects::{BoundedText, ProblemStatus};
    use crate::error::ForumError;
    use crate::infra::memory::MemoryForumStore;

    fn acceptor(
        store: &Arc<MemoryForumStore>,
    ) -> AcceptSolutionUseCase<MemoryForumStore, MemoryForumStore, MemoryForumStore> {
        AcceptSolutionUseCase::new(store.clone(), store.clone(), store.clone())
    }

    async fn accepted_count(store: &MemoryForumStore, solution: &Solution) -> usize {
        store
            .list_solutions(&solution.problem_id)
            .await
            .unwrap()
            .iter()
            .filter(|s| s.is_accepted)
            .count()
    }

    #[tokio::test]
    async fn test_owner_accepts_solution() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let author = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let solution = fixtures::solution(&store, &problem, author).await;

        let output = acceptor(&store).execute(solution.id, owner).await.unwrap();

        assert!(output.solution.is_accepted);
        assert!(output.newly_accepted);
        assert_eq!(output.problem_status, ProblemStatus::Resolved);

        let problem = store.get_problem(&problem.id).await.unwrap().unwrap();
        assert_eq!(problem.status, ProblemStatus::Resolved);

        let member = store.get_member(&author).await.unwrap().unwrap();
        assert_eq!(member.problems_solved, 1);
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden_and_nothing_changes() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let author = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let solution = fixtures::solution(&store, &problem, author).await;

        let err = acceptor(&store).execute(solution.id, author).await.unwrap_err();
        assert!(matches!(err, ForumError::Forbidden(_)));

        let stored = store.get_solution(&solution.id).await.unwrap().unwrap();
        assert!(!stored.is_accepted);
        let problem = store.get_problem(&problem.id).await.unwrap().unwrap();
        assert_eq!(problem.status, ProblemStatus::Open);
        let member = store.get_member(&author).await.unwrap().unwrap();
        assert_eq!(member.problems_solved, 0);
    }

    #[tokio::test]
    async fn test_accept_missing_solution() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);

        let err = acceptor(&store)
            .execute(SolutionId::new(), owner)
            .await
            .unwrap_err();
        assert!(matches!(err, ForumError::SolutionNotFound));
    }

    #[tokio::test]
    async fn test_accepting_another_solution_demotes_previous() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let author = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let first = fixtures::solution(&store, &problem, author).await;
        let second = fixtures::solution(&store, &problem, author).await;

        acceptor(&store).execute(first.id, owner).await.unwrap();
        let output = acceptor(&store).execute(second.id, owner).await.unwrap();

        assert_eq!(output.demoted, 1);
        let first = store.get_solution(&first.id).await.unwrap().unwrap();
        assert!(!first.is_accepted);
        assert_eq!(accepted_count(&store, &second).await, 1);

        // Credited once per actual acceptance
        let member = store.get_member(&author).await.unwrap().unwrap();
        assert_eq!(member.problems_solved, 2);
    }

    #[tokio::test]
    async fn test_reaccepting_does_not_double_credit() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let author = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let solution = fixtures::solution(&store, &problem, author).await;

        acceptor(&store).execute(solution.id, owner).await.unwrap();
        let again = acceptor(&store).execute(solution.id, owner).await.unwrap();

        assert!(!again.newly_accepted);
        assert!(again.solution.is_accepted);
        let member = store.get_member(&author).await.unwrap().unwrap();
        assert_eq!(member.problems_solved, 1);
    }

    #[tokio::test]
    async fn test_acceptance_repairs_multiple_accepted() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let author = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;

        // Seed drift directly through the store
        for _ in 0..2 {
            let mut drifted = Solution::new(
                problem.id,
                author,
                BoundedText::new("legacy", "Description", 100).unwrap(),
            );
            drifted.is_accepted = true;
            store.insert_solution(&drifted).await.unwrap();
        }
        let fresh = fixtures::solution(&store, &problem, author).await;

        let output = acceptor(&store).execute(fresh.id, owner).await.unwrap();

        assert_eq!(output.demoted, 2);
        assert_eq!(accepted_count(&store, &fresh).await, 1);
    }

    #[tokio::test]
    async fn test_mark_accepted_rejects_rival() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let first = fixtures::solution(&store, &problem, owner).await;
        let second = fixtures::solution(&store, &problem, owner).await;

        store.mark_accepted(&first.id).await.unwrap();
        let err = store.mark_accepted(&second.id).await.unwrap_err();

        assert!(matches!(err, ForumError::PreconditionFailed(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accepts_leave_one_accepted() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let author = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;

        let mut solutions = Vec::new();
        for _ in 0..8 {
            solutions.push(fixtures::solution(&store, &problem, author).await);
        }

        let handles: Vec<_> = solutions
            .iter()
            .map(|solution| {
                let store = store.clone();
                let id = solution.id;
                tokio::spawn(async move { acceptor(&store).execute(id, owner).await })
            })
            .collect();

        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) | Err(ForumError::PreconditionFailed(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(accepted_count(&store, &solutions[0]).await, 1);
        let problem = store.get_problem(&problem.id).await.unwrap().unwrap();
        assert_eq!(problem.status, ProblemStatus::Resolved);
    }

    #[tokio::test]
    async fn test_acceptance_credits_unregistered_author_best_effort() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let solution = fixtures::solution(&store, &problem, UserId::new()).await;

        let output = acceptor(&store).execute(solution.id, owner).await.unwrap();
        assert!(output.solution.is_accepted);
    }
}

#[cfg(test)]
mod problem_tests {
    use kernel::id::ProblemId;

    use super::fixtures;
    use crate::application::create_problem::CreateProblemUseCase;
    use crate::application::query_problems::{ListProblemsInput, QueryProblemsUseCase};
    use crate::application::update_problem::{UpdateProblemInput, UpdateProblemUseCase};
    use crate::domain::value_objects::{Category, ProblemStatus, UpvoteTarget, Urgency};
    use crate::error::ForumError;

    #[tokio::test]
    async fn test_create_problem_defaults() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);

        let problem = fixtures::problem(&store, owner).await;

        assert_eq!(problem.status, ProblemStatus::Open);
        assert_eq!(problem.urgency, Urgency::Medium);
        assert_eq!(problem.category, Category::Infrastructure);
        assert_eq!(problem.created_by, owner);
        assert_eq!((problem.upvote_count, problem.solution_count), (0, 0));
    }

    #[tokio::test]
    async fn test_create_problem_validation() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let use_case = CreateProblemUseCase::new(store.clone(), fixtures::config());

        let mut input = fixtures::problem_input(&"t".repeat(201));
        assert!(matches!(
            use_case.execute(input.clone(), owner).await,
            Err(ForumError::Validation(_))
        ));

        input = fixtures::problem_input("Broken lights");
        input.category = "weather".to_string();
        assert!(matches!(
            use_case.execute(input.clone(), owner).await,
            Err(ForumError::Validation(_))
        ));

        input = fixtures::problem_input("Broken lights");
        input.images = vec!["https://img".to_string(); 11];
        assert!(matches!(
            use_case.execute(input, owner).await,
            Err(ForumError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_requires_owner() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let other = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let use_case = UpdateProblemUseCase::new(store.clone(), fixtures::config());

        let input = UpdateProblemInput {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };
        let err = use_case
            .execute(problem.id, input, other)
            .await
            .unwrap_err();
        assert!(matches!(err, ForumError::Forbidden(_)));

        let input = UpdateProblemInput {
            title: Some("Flooded crossing at Elm".to_string()),
            status: Some("in-progress".to_string()),
            ..Default::default()
        };
        let updated = use_case.execute(problem.id, input, owner).await.unwrap();
        assert_eq!(updated.title, "Flooded crossing at Elm");
        assert_eq!(updated.status, ProblemStatus::InProgress);
    }

    #[tokio::test]
    async fn test_update_status_rules() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let use_case = UpdateProblemUseCase::new(store.clone(), fixtures::config());

        let to = |status: &str| UpdateProblemInput {
            status: Some(status.to_string()),
            ..Default::default()
        };

        assert!(matches!(
            use_case.execute(problem.id, to("resolved"), owner).await,
            Err(ForumError::Validation(_))
        ));
        let closed = use_case
            .execute(problem.id, to("closed"), owner)
            .await
            .unwrap();
        assert_eq!(closed.status, ProblemStatus::Closed);
        let reopened = use_case
            .execute(problem.id, to("open"), owner)
            .await
            .unwrap();
        assert_eq!(reopened.status, ProblemStatus::Open);
    }

    #[tokio::test]
    async fn test_resolved_problem_only_closes() {
        use crate::application::accept_solution::AcceptSolutionUseCase;

        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let solution = fixtures::solution(&store, &problem, owner).await;
        AcceptSolutionUseCase::new(store.clone(), store.clone(), store.clone())
            .execute(solution.id, owner)
            .await
            .unwrap();

        let use_case = UpdateProblemUseCase::new(store.clone(), fixtures::config());
        let reopen = UpdateProblemInput {
            status: Some("open".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            use_case.execute(problem.id, reopen, owner).await,
            Err(ForumError::Validation(_))
        ));

        let close = UpdateProblemInput {
            status: Some("closed".to_string()),
            ..Default::default()
        };
        let closed = use_case.execute(problem.id, close, owner).await.unwrap();
        assert_eq!(closed.status, ProblemStatus::Closed);
    }

    #[tokio::test]
    async fn test_list_filters_and_paging() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let create = CreateProblemUseCase::new(store.clone(), fixtures::config());

        for i in 0..12 {
            let mut input = fixtures::problem_input(&format!("Pothole #{i}"));
            if i % 3 == 0 {
                input.category = "environment".to_string();
                input.location = "Riverside Park".to_string();
            }
            create.execute(input, owner).await.unwrap();
        }

        let query = QueryProblemsUseCase::new(
            store.clone(),
            store.clone(),
            store.clone(),
            fixtures::config(),
        );

        let first = query.list(ListProblemsInput::default()).await.unwrap();
        assert_eq!(first.total, 12);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages(), 2);
        assert!(first.items.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let second = query
            .list(ListProblemsInput {
                page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(second.items.len(), 2);

        let environment = query
            .list(ListProblemsInput {
                category: Some("environment".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(environment.total, 4);

        let search = query
            .list(ListProblemsInput {
                search: Some("RIVERSIDE".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(search.total, 4);

        assert!(matches!(
            query
                .list(ListProblemsInput {
                    status: Some("pending".to_string()),
                    ..Default::default()
                })
                .await,
            Err(ForumError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_problem_personalised() {
        use crate::application::toggle_upvote::ToggleUpvoteUseCase;

        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let viewer = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        ToggleUpvoteUseCase::new(store.clone())
            .execute(UpvoteTarget::Problem(problem.id), viewer)
            .await
            .unwrap();

        let query = QueryProblemsUseCase::new(
            store.clone(),
            store.clone(),
            store.clone(),
            fixtures::config(),
        );

        let anonymous = query.get(problem.id, None).await.unwrap();
        assert_eq!(anonymous.has_upvoted, None);
        assert_eq!(anonymous.problem.upvote_count, 1);

        let personal = query.get(problem.id, Some(viewer)).await.unwrap();
        assert_eq!(personal.has_upvoted, Some(true));
        let owner_view = query.get(problem.id, Some(owner)).await.unwrap();
        assert_eq!(owner_view.has_upvoted, Some(false));

        assert!(matches!(
            query.get(ProblemId::new(), None).await,
            Err(ForumError::ProblemNotFound)
        ));
        assert!(matches!(
            query.solutions(ProblemId::new()).await,
            Err(ForumError::ProblemNotFound)
        ));
    }
}

#[cfg(test)]
mod comment_tests {
    use kernel::id::SolutionId;

    use super::fixtures;
    use crate::application::add_comment::AddCommentUseCase;
    use crate::domain::repository::SolutionRepository;
    use crate::error::ForumError;

    #[tokio::test]
    async fn test_comments_append_and_count() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let commenter = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let solution = fixtures::solution(&store, &problem, owner).await;
        let use_case = AddCommentUseCase::new(store.clone(), fixtures::config());

        let first = use_case
            .execute(solution.id, commenter, "  Who maintains the drain?  ")
            .await
            .unwrap();
        assert_eq!(first.comment.text, "Who maintains the drain?");
        assert_eq!(first.comment_count, 1);

        let second = use_case
            .execute(solution.id, owner, "The city, per the 2019 plan")
            .await
            .unwrap();
        assert_eq!(second.comment_count, 2);

        let stored = store.get_solution(&solution.id).await.unwrap().unwrap();
        assert_eq!(stored.comments.len() as i64, stored.comment_count);
        assert_eq!(stored.comments[0].user_id, commenter);
    }

    #[tokio::test]
    async fn test_comment_validation_and_missing_solution() {
        let store = fixtures::store();
        let owner = fixtures::member(&store);
        let problem = fixtures::problem(&store, owner).await;
        let solution = fixtures::solution(&store, &problem, owner).await;
        let use_case = AddCommentUseCase::new(store.clone(), fixtures::config());

        assert!(matches!(
            use_case.execute(solution.id, owner, &"c".repeat(501)).await,
            Err(ForumError::Validation(_))
        ));
        assert!(matches!(
            use_case.execute(solution.id, owner, " ").await,
            Err(ForumError::Validation(_))
        ));
        assert!(matches!(
            use_case.execute(SolutionId::new(), owner, "hello").await,
            Err(ForumError::SolutionNotFound)
        ));
    }
}

#[cfg(test)]
mod router_tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::{Extension, Router};
    use http_body_util::BodyExt;
    use kernel::id::UserId;
    use kernel::principal::Principal;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::application::config::ForumConfig;
    use crate::infra::memory::MemoryForumStore;
    use crate::presentation::router::forum_router_generic;

    fn app(store: &MemoryForumStore, principal: Option<UserId>) -> Router {
        let router = forum_router_generic(store.clone(), ForumConfig::default());
        match principal {
            Some(user_id) => router.layer(Extension(Principal::new(user_id))),
            None => router,
        }
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn problem_body() -> Value {
        json!({
            "title": "Broken streetlight",
            "description": "Dark corner since March",
            "location": "Oak Ave",
            "category": "infrastructure",
            "urgency": "high"
        })
    }

    #[tokio::test]
    async fn test_mutations_require_principal() {
        let store = MemoryForumStore::new();

        let (status, body) = send(app(&store, None), "POST", "/problems", Some(problem_body())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = send(app(&store, None), "GET", "/problems", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_problem_flow_over_http() {
        let store = MemoryForumStore::new();
        let owner = UserId::new();
        let helper = UserId::new();
        store.insert_member(owner, "owner");
        store.insert_member(helper, "helper");

        let (status, body) =
            send(app(&store, Some(owner)), "POST", "/problems", Some(problem_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["problem"]["urgency"], "high");
        let problem_id = body["problem"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app(&store, Some(helper)),
            "POST",
            &format!("/problems/{problem_id}/upvote"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["upvoteCount"], 1);
        assert_eq!(body["hasUpvoted"], true);

        let (status, body) = send(
            app(&store, Some(helper)),
            "POST",
            "/solutions",
            Some(json!({ "problemId": problem_id, "description": "Replace the bulb" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let solution_id = body["solution"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app(&store, Some(helper)),
            "PATCH",
            &format!("/solutions/{solution_id}/accept"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, body) = send(
            app(&store, Some(owner)),
            "PATCH",
            &format!("/solutions/{solution_id}/accept"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["solution"]["isAccepted"], true);
        assert_eq!(body["problemStatus"], "resolved");

        let (status, body) = send(
            app(&store, None),
            "GET",
            &format!("/problems/{problem_id}/solutions"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(
            app(&store, Some(owner)),
            "PUT",
            &format!("/problems/{problem_id}"),
            Some(json!({ "status": "open" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_responses_carry_author_profiles() {
        let store = MemoryForumStore::new();
        let owner = UserId::new();
        let helper = UserId::new();
        store.insert_member(owner, "river_keeper");
        store.insert_member(helper, "lamp_fixer");

        let (_, body) =
            send(app(&store, Some(owner)), "POST", "/problems", Some(problem_body())).await;
        assert_eq!(body["problem"]["createdBy"]["username"], "river_keeper");
        assert_eq!(body["problem"]["createdBy"]["id"], owner.to_string());
        let problem_id = body["problem"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app(&store, Some(helper)),
            "POST",
            "/solutions",
            Some(json!({ "problemId": problem_id, "description": "Replace the bulb" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let proposed_by = &body["solution"]["proposedBy"];
        assert_eq!(proposed_by["username"], "lamp_fixer");
        assert_eq!(proposed_by["solutionsProvided"], 1);
        let solution_id = body["solution"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app(&store, Some(owner)),
            "POST",
            &format!("/solutions/{solution_id}/comments"),
            Some(json!({ "text": "Thanks, that worked" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["comment"]["user"]["username"], "river_keeper");

        let (_, body) = send(app(&store, None), "GET", "/problems", None).await;
        assert_eq!(body["problems"][0]["createdBy"]["username"], "river_keeper");

        let (_, body) = send(
            app(&store, None),
            "GET",
            &format!("/problems/{problem_id}"),
            None,
        )
        .await;
        assert_eq!(body["createdBy"]["problemsSolved"], 0);
        assert_eq!(body["createdBy"]["bio"], Value::Null);

        let (_, body) = send(
            app(&store, None),
            "GET",
            &format!("/problems/{problem_id}/solutions"),
            None,
        )
        .await;
        assert_eq!(body[0]["proposedBy"]["username"], "lamp_fixer");
        assert_eq!(body[0]["comments"][0]["user"]["username"], "river_keeper");

        let (_, body) = send(
            app(&store, Some(owner)),
            "PATCH",
            &format!("/solutions/{solution_id}/accept"),
            None,
        )
        .await;
        assert_eq!(body["solution"]["proposedBy"]["problemsSolved"], 1);
    }

    #[tokio::test]
    async fn test_missing_author_renders_placeholder() {
        let store = MemoryForumStore::new();
        // Authenticated but never registered with the store
        let ghost = UserId::new();

        let (status, body) =
            send(app(&store, Some(ghost)), "POST", "/problems", Some(problem_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["problem"]["createdBy"]["username"], "[deleted]");
        assert_eq!(body["problem"]["createdBy"]["id"], ghost.to_string());
    }

    #[tokio::test]
    async fn test_unknown_problem_is_404() {
        let store = MemoryForumStore::new();
        let (status, body) = send(
            app(&store, None),
            "GET",
            &format!("/problems/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Problem not found");
    }
}

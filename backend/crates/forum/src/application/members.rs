//! Author Lookups
//!
//! Read responses show who wrote what. The ids referenced by a batch of
//! problems or solutions are resolved in one store call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entities::{Member, Problem, Solution};
use crate::domain::repository::MemberRepository;
use crate::error::ForumResult;

/// Profiles of the accounts referenced by one response
#[derive(Debug, Clone, Default)]
pub struct MemberDirectory {
    members: HashMap<UserId, Member>,
}

impl MemberDirectory {
    pub fn get(&self, user_id: &UserId) -> Option<&Member> {
        self.members.get(user_id)
    }
}

/// Resolve Members Use Case
pub struct ResolveMembersUseCase<M>
where
    M: MemberRepository,
{
    member_repo: Arc<M>,
}

impl<M> ResolveMembersUseCase<M>
where
    M: MemberRepository,
{
    pub fn new(member_repo: Arc<M>) -> Self {
        Self { member_repo }
    }

    pub async fn execute(
        &self,
        user_ids: impl IntoIterator<Item = UserId>,
    ) -> ForumResult<MemberDirectory> {
        let unique: HashSet<UserId> = user_ids.into_iter().collect();
        if unique.is_empty() {
            return Ok(MemberDirectory::default());
        }

        let ids: Vec<UserId> = unique.into_iter().collect();
        let members = self.member_repo.find_members(&ids).await?;

        if members.len() < ids.len() {
            tracing::warn!(
                requested = ids.len(),
                found = members.len(),
                "Some referenced accounts no longer exist"
            );
        }

        Ok(MemberDirectory {
            members: members.into_iter().map(|m| (m.user_id, m)).collect(),
        })
    }
}

/// Creators of the given problems
pub fn problem_authors<'a>(problems: impl IntoIterator<Item = &'a Problem>) -> Vec<UserId> {
    problems.into_iter().map(|p| p.created_by).collect()
}

/// Proposers of the given solutions and everyone who commented on them
pub fn solution_authors<'a>(solutions: impl IntoIterator<Item = &'a Solution>) -> Vec<UserId> {
    solutions
        .into_iter()
        .flat_map(|s| {
            std::iter::once(s.proposed_by).chain(s.comments.iter().map(|c| c.user_id))
        })
        .collect()
}

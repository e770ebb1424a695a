//! PostgreSQL Repository Implementations
//!
//! Counters only ever move through `SET c = c + $delta`; the `CHECK (c >= 0)`
//! constraints reject any write that would take one below zero. Upvoter sets
//! are keyed tables changed in the same statement as their counter, so the
//! two never diverge. The partial unique index
//! `solutions_one_accepted_per_problem` backs the single-accepted invariant.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kernel::id::{ProblemId, SolutionId, UserId};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entities::{Acceptance, Comment, Member, Problem, Solution};
use crate::domain::repository::{
    MemberRepository, Page, ProblemChanges, ProblemQuery, ProblemRepository, SolutionRepository,
    UpvoteChange, UpvoteRepository,
};
use crate::domain::value_objects::{
    Delta, ProblemCounter, ProblemStatus, ReputationCounter, SolutionCounter, UpvoteTarget,
};
use crate::error::{ForumError, ForumResult};

const PROBLEM_COLUMNS: &str = "problem_id, title, description, location, images, category, \
     urgency, status, created_by, upvote_count, solution_count, created_at, updated_at";

const MEMBER_COLUMNS: &str =
    "user_id, user_name, avatar_url, bio, problems_solved, solutions_provided";

const SOLUTION_COLUMNS: &str = "solution_id, problem_id, proposed_by, description, \
     upvote_count, comment_count, is_accepted, created_at, updated_at";

/// PostgreSQL-backed forum store
#[derive(Clone)]
pub struct PgForumStore {
    pool: PgPool,
}

impl PgForumStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn problem_exists(&self, id: Uuid) -> ForumResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM problems WHERE problem_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Run one set-and-counter statement from `add_upvote`/`remove_upvote`
    async fn change_upvote(
        &self,
        sql: &str,
        target: UpvoteTarget,
        id: Uuid,
        user_id: &UserId,
    ) -> ForumResult<UpvoteChange> {
        let row = sqlx::query_as::<_, UpvoteChangeRow>(sql)
            .bind(id)
            .bind(*user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| not_found_on_fk(e, target.not_found()))?
            .ok_or_else(|| target.not_found())?;

        Ok(UpvoteChange {
            upvote_count: row.upvote_count,
            changed: row.changed > 0,
        })
    }

    /// Attach comments (oldest first) to the given solution rows
    async fn with_comments(&self, rows: Vec<SolutionRow>) -> ForumResult<Vec<Solution>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.solution_id).collect();
        let comment_rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT comment_id, solution_id, user_id, body, created_at
            FROM solution_comments
            WHERE solution_id = ANY($1)
            ORDER BY created_at ASC, comment_id ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_solution: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            let solution_id = row.solution_id;
            by_solution
                .entry(solution_id)
                .or_default()
                .push(row.into_comment());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let comments = by_solution.remove(&row.solution_id).unwrap_or_default();
                row.into_solution(comments)
            })
            .collect())
    }

    async fn with_comments_one(&self, row: SolutionRow) -> ForumResult<Solution> {
        self.with_comments(vec![row])
            .await?
            .pop()
            .ok_or_else(|| ForumError::Internal("solution row vanished".to_string()))
    }
}

impl ProblemRepository for PgForumStore {
    async fn insert_problem(&self, problem: &Problem) -> ForumResult<()> {
        sqlx::query(
            r#"
            INSERT INTO problems (
                problem_id,
                title,
                description,
                location,
                images,
                category,
                urgency,
                status,
                created_by,
                upvote_count,
                solution_count,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, 0, $10, $11)
            "#,
        )
        .bind(*problem.id.as_uuid())
        .bind(&problem.title)
        .bind(&problem.description)
        .bind(&problem.location)
        .bind(&problem.images)
        .bind(problem.category.as_str())
        .bind(problem.urgency.as_str())
        .bind(problem.status.as_str())
        .bind(*problem.created_by.as_uuid())
        .bind(problem.created_at)
        .bind(problem.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| not_found_on_fk(e, ForumError::UserNotFound))?;

        Ok(())
    }

    async fn get_problem(&self, id: &ProblemId) -> ForumResult<Option<Problem>> {
        let sql = format!("SELECT {PROBLEM_COLUMNS} FROM problems WHERE problem_id = $1");
        sqlx::query_as::<_, ProblemRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(ProblemRow::into_problem)
            .transpose()
    }

    async fn search_problems(&self, query: &ProblemQuery) -> ForumResult<Page<Problem>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM problems");
        push_problem_filters(&mut count, query);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PROBLEM_COLUMNS} FROM problems"
        ));
        push_problem_filters(&mut select, query);
        select
            .push(" ORDER BY created_at DESC, problem_id DESC LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);

        let items = select
            .build_query_as::<ProblemRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ProblemRow::into_problem)
            .collect::<ForumResult<Vec<_>>>()?;

        Ok(Page {
            items,
            total: total.max(0) as u64,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn apply_problem_delta(
        &self,
        id: &ProblemId,
        counter: ProblemCounter,
        delta: Delta,
    ) -> ForumResult<Problem> {
        let sql = format!(
            "UPDATE problems SET {col} = {col} + $2 \
             WHERE problem_id = $1 RETURNING {PROBLEM_COLUMNS}",
            col = counter.column()
        );

        sqlx::query_as::<_, ProblemRow>(&sql)
            .bind(*id.as_uuid())
            .bind(delta.value())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ForumError::ProblemNotFound)?
            .into_problem()
    }

    async fn set_problem_fields(
        &self,
        id: &ProblemId,
        changes: &ProblemChanges,
        expected_status: Option<ProblemStatus>,
    ) -> ForumResult<Problem> {
        let sql = format!(
            r#"
            UPDATE problems SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                images = COALESCE($5, images),
                category = COALESCE($6, category),
                urgency = COALESCE($7, urgency),
                status = COALESCE($8, status),
                updated_at = now()
            WHERE problem_id = $1 AND ($9::TEXT IS NULL OR status = $9)
            RETURNING {PROBLEM_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ProblemRow>(&sql)
            .bind(*id.as_uuid())
            .bind(changes.title.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.location.as_deref())
            .bind(changes.images.as_ref())
            .bind(changes.category.map(|c| c.as_str()))
            .bind(changes.urgency.map(|u| u.as_str()))
            .bind(changes.status.map(|s| s.as_str()))
            .bind(expected_status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row.into_problem(),
            None if self.problem_exists(*id.as_uuid()).await? => {
                tracing::warn!(problem_id = %id, "Problem status changed before conditional write");
                Err(ForumError::precondition_failed(
                    "Problem status changed concurrently",
                ))
            }
            None => Err(ForumError::ProblemNotFound),
        }
    }
}

impl SolutionRepository for PgForumStore {
    async fn insert_solution(&self, solution: &Solution) -> ForumResult<()> {
        sqlx::query(
            r#"
            INSERT INTO solutions (
                solution_id,
                problem_id,
                proposed_by,
                description,
                upvote_count,
                comment_count,
                is_accepted,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, 0, 0, FALSE, $5, $6)
            "#,
        )
        .bind(*solution.id.as_uuid())
        .bind(*solution.problem_id.as_uuid())
        .bind(*solution.proposed_by.as_uuid())
        .bind(&solution.description)
        .bind(solution.created_at)
        .bind(solution.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| not_found_on_fk(e, ForumError::ProblemNotFound))?;

        Ok(())
    }

    async fn get_solution(&self, id: &SolutionId) -> ForumResult<Option<Solution>> {
        let sql = format!("SELECT {SOLUTION_COLUMNS} FROM solutions WHERE solution_id = $1");
        let row = sqlx::query_as::<_, SolutionRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.with_comments_one(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_solutions(&self, problem_id: &ProblemId) -> ForumResult<Vec<Solution>> {
        let sql = format!(
            "SELECT {SOLUTION_COLUMNS} FROM solutions WHERE problem_id = $1 \
             ORDER BY upvote_count DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, SolutionRow>(&sql)
            .bind(*problem_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        self.with_comments(rows).await
    }

    async fn apply_solution_delta(
        &self,
        id: &SolutionId,
        counter: SolutionCounter,
        delta: Delta,
    ) -> ForumResult<Solution> {
        let sql = format!(
            "UPDATE solutions SET {col} = {col} + $2 \
             WHERE solution_id = $1 RETURNING {SOLUTION_COLUMNS}",
            col = counter.column()
        );

        let row = sqlx::query_as::<_, SolutionRow>(&sql)
            .bind(*id.as_uuid())
            .bind(delta.value())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ForumError::SolutionNotFound)?;

        self.with_comments_one(row).await
    }

    async fn append_comment(&self, id: &SolutionId, comment: &Comment) -> ForumResult<()> {
        sqlx::query(
            r#"
            INSERT INTO solution_comments (comment_id, solution_id, user_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(comment.id)
        .bind(*id.as_uuid())
        .bind(*comment.user_id.as_uuid())
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| not_found_on_fk(e, ForumError::SolutionNotFound))?;

        Ok(())
    }

    async fn clear_accepted_except(
        &self,
        problem_id: &ProblemId,
        keep: &SolutionId,
    ) -> ForumResult<u64> {
        let demoted = sqlx::query(
            r#"
            UPDATE solutions
            SET is_accepted = FALSE, updated_at = now()
            WHERE problem_id = $1 AND solution_id <> $2 AND is_accepted
            "#,
        )
        .bind(*problem_id.as_uuid())
        .bind(*keep.as_uuid())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if demoted > 0 {
            tracing::info!(problem_id = %problem_id, demoted, "Demoted accepted solutions");
        }

        Ok(demoted)
    }

    async fn mark_accepted(&self, id: &SolutionId) -> ForumResult<Acceptance> {
        let sql = format!(
            "UPDATE solutions SET is_accepted = TRUE, updated_at = now() \
             WHERE solution_id = $1 AND NOT is_accepted RETURNING {SOLUTION_COLUMNS}"
        );

        let result = sqlx::query_as::<_, SolutionRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await;

        let row = match result {
            Ok(row) => row,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tracing::warn!(solution_id = %id, "Another solution was accepted concurrently");
                return Err(ForumError::precondition_failed(
                    "Another solution was accepted concurrently",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(row) = row {
            return Ok(Acceptance::Transitioned(self.with_comments_one(row).await?));
        }

        match self.get_solution(id).await? {
            Some(solution) if solution.is_accepted => Ok(Acceptance::Unchanged(solution)),
            Some(_) => Err(ForumError::precondition_failed(
                "Solution acceptance changed concurrently",
            )),
            None => Err(ForumError::SolutionNotFound),
        }
    }
}

impl UpvoteRepository for PgForumStore {
    async fn has_upvote(&self, target: UpvoteTarget, user_id: &UserId) -> ForumResult<bool> {
        let (table, key, id) = upvote_target_parts(target);
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {table} u WHERE u.{key} = $1 AND u.user_id = $2) \
             FROM {} WHERE {key} = $1",
            upvote_parent_table(target)
        );

        sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .bind(*user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| target.not_found())
    }

    async fn add_upvote(
        &self,
        target: UpvoteTarget,
        user_id: &UserId,
    ) -> ForumResult<UpvoteChange> {
        let (table, key, id) = upvote_target_parts(target);
        let sql = format!(
            r#"
            WITH ins AS (
                INSERT INTO {table} ({key}, user_id) VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                RETURNING 1
            )
            UPDATE {parent}
            SET upvote_count = upvote_count + (SELECT COUNT(*) FROM ins)
            WHERE {key} = $1
            RETURNING upvote_count, (SELECT COUNT(*) FROM ins) AS changed
            "#,
            parent = upvote_parent_table(target)
        );

        self.change_upvote(&sql, target, id, user_id).await
    }

    async fn remove_upvote(
        &self,
        target: UpvoteTarget,
        user_id: &UserId,
    ) -> ForumResult<UpvoteChange> {
        let (table, key, id) = upvote_target_parts(target);
        let sql = format!(
            r#"
            WITH del AS (
                DELETE FROM {table} WHERE {key} = $1 AND user_id = $2
                RETURNING 1
            )
            UPDATE {parent}
            SET upvote_count = upvote_count - (SELECT COUNT(*) FROM del)
            WHERE {key} = $1
            RETURNING upvote_count, (SELECT COUNT(*) FROM del) AS changed
            "#,
            parent = upvote_parent_table(target)
        );

        self.change_upvote(&sql, target, id, user_id).await
    }
}

impl MemberRepository for PgForumStore {
    async fn get_member(&self, user_id: &UserId) -> ForumResult<Option<Member>> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM users WHERE user_id = $1");
        let row = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(*user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(MemberRow::into_member))
    }

    async fn find_members(&self, user_ids: &[UserId]) -> ForumResult<Vec<Member>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = user_ids.iter().map(|id| *id.as_uuid()).collect();
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM users WHERE user_id = ANY($1)");
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(MemberRow::into_member).collect())
    }

    async fn apply_member_delta(
        &self,
        user_id: &UserId,
        counter: ReputationCounter,
        delta: Delta,
    ) -> ForumResult<Member> {
        let sql = format!(
            "UPDATE users SET {col} = {col} + $2 WHERE user_id = $1 \
             RETURNING {MEMBER_COLUMNS}",
            col = counter.column()
        );

        let row = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(*user_id.as_uuid())
            .bind(delta.value())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ForumError::UserNotFound)?;

        Ok(row.into_member())
    }
}

/// Upvote table, key column and key value for a target
fn upvote_target_parts(target: UpvoteTarget) -> (&'static str, &'static str, Uuid) {
    match target {
        UpvoteTarget::Problem(id) => ("problem_upvotes", "problem_id", *id.as_uuid()),
        UpvoteTarget::Solution(id) => ("solution_upvotes", "solution_id", *id.as_uuid()),
    }
}

fn upvote_parent_table(target: UpvoteTarget) -> &'static str {
    match target {
        UpvoteTarget::Problem(_) => "problems",
        UpvoteTarget::Solution(_) => "solutions",
    }
}

fn push_problem_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProblemQuery) {
    qb.push(" WHERE TRUE");

    if let Some(category) = query.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR location ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escape LIKE wildcards so search input is matched literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Map a foreign-key violation to NotFound
///
/// Violations of a user reference become `UserNotFound`, anything else
/// `fallback`.
fn not_found_on_fk(err: sqlx::Error, fallback: ForumError) -> ForumError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            let user_ref = db.constraint().is_some_and(|c| {
                c.ends_with("user_id_fkey")
                    || c.ends_with("created_by_fkey")
                    || c.ends_with("proposed_by_fkey")
            });
            if user_ref {
                ForumError::UserNotFound
            } else {
                fallback
            }
        }
        _ => ForumError::Database(err),
    }
}

fn corrupt(column: &str, value: &str) -> ForumError {
    ForumError::Internal(format!("invalid {} '{}' in storage", column, value))
}

#[derive(sqlx::FromRow)]
struct ProblemRow {
    problem_id: Uuid,
    title: String,
    description: String,
    location: String,
    images: Vec<String>,
    category: String,
    urgency: String,
    status: String,
    created_by: Uuid,
    upvote_count: i64,
    solution_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProblemRow {
    fn into_problem(self) -> ForumResult<Problem> {
        Ok(Problem {
            id: ProblemId::from_uuid(self.problem_id),
            category: self
                .category
                .parse()
                .map_err(|_| corrupt("category", &self.category))?,
            urgency: self
                .urgency
                .parse()
                .map_err(|_| corrupt("urgency", &self.urgency))?,
            status: self
                .status
                .parse()
                .map_err(|_| corrupt("status", &self.status))?,
            title: self.title,
            description: self.description,
            location: self.location,
            images: self.images,
            created_by: UserId::from_uuid(self.created_by),
            upvote_count: self.upvote_count,
            solution_count: self.solution_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SolutionRow {
    solution_id: Uuid,
    problem_id: Uuid,
    proposed_by: Uuid,
    description: String,
    upvote_count: i64,
    comment_count: i64,
    is_accepted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SolutionRow {
    fn into_solution(self, comments: Vec<Comment>) -> Solution {
        Solution {
            id: SolutionId::from_uuid(self.solution_id),
            problem_id: ProblemId::from_uuid(self.problem_id),
            proposed_by: UserId::from_uuid(self.proposed_by),
            description: self.description,
            upvote_count: self.upvote_count,
            comment_count: self.comment_count,
            comments,
            is_accepted: self.is_accepted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    comment_id: Uuid,
    solution_id: Uuid,
    user_id: Uuid,
    body: String,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: self.comment_id,
            user_id: UserId::from_uuid(self.user_id),
            text: self.body,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UpvoteChangeRow {
    upvote_count: i64,
    changed: i64,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    user_id: Uuid,
    user_name: String,
    avatar_url: Option<String>,
    bio: Option<String>,
    problems_solved: i64,
    solutions_provided: i64,
}

impl MemberRow {
    fn into_member(self) -> Member {
        Member {
            user_id: UserId::from_uuid(self.user_id),
            user_name: self.user_name,
            avatar: self.avatar_url,
            bio: self.bio,
            problems_solved: self.problems_solved,
            solutions_provided: self.solutions_provided,
        }
    }
}

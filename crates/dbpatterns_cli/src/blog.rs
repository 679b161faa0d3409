//! Blog demonstration: eager loading, aggregate query, and hook-maintained
//! counters observed through create and delete.

use crate::{connect, report, SetupResult};
use dbpatterns_core::config::{ConnectionArgs, BLOG_DB};
use dbpatterns_core::db::PoolLimits;
use dbpatterns_core::query::blog::{final_status, most_commented_post, user_with_posts_and_comments};
use dbpatterns_core::{
    audit_counters, BlogRepository, NewComment, NewPost, NewUser, RepoResult,
    SqliteBlogRepository, UserId, UserListQuery,
};

const FIRST_AUTHOR: &str = "张三";

pub(crate) fn run(connection: &ConnectionArgs) -> SetupResult<()> {
    let pool = connect(connection, BLOG_DB, PoolLimits::BLOG)?;
    let mut conn = pool.get()?;
    let mut repo = SqliteBlogRepository::new(&mut conn);
    let author = seed_if_empty(&mut repo)?;

    println!("\nposts and comments of user {author}:");
    match user_with_posts_and_comments(repo.conn(), author) {
        Ok(tree) => {
            println!("posts by {}:", tree.user.name);
            for (idx, entry) in tree.posts.iter().enumerate() {
                println!(
                    "  {}. {} (comments: {})",
                    idx + 1,
                    entry.post.title,
                    entry.comments.len()
                );
                for (comment_idx, comment) in entry.comments.iter().enumerate() {
                    println!("    - {}. {}", comment_idx + 1, comment.content);
                }
            }
        }
        Err(err) => report("user_with_posts_and_comments", &err),
    }

    println!("\nmost commented post:");
    match most_commented_post(repo.conn()) {
        Ok(top) => println!(
            "{} (ID: {}, comments: {})",
            top.post.title, top.post.id, top.comment_count
        ),
        Err(err) => report("most_commented_post", &err),
    }

    println!("\ncreating a post to exercise the article counter:");
    let new_post = NewPost::new(
        "钩子函数测试文章",
        "测试创建文章时自动更新用户文章数量",
        author,
    );
    match repo.create_post(&new_post) {
        Ok(post_id) => println!("post {post_id} created"),
        Err(err) => report("create_post", &err),
    }

    println!("\ndeleting a comment to exercise the comment status:");
    match repo.first_comment() {
        Ok(comment) => match repo.delete_comment(comment.id) {
            Ok(()) => println!(
                "comment {} deleted from post {}",
                comment.id, comment.post_id
            ),
            Err(err) => report("delete_comment", &err),
        },
        Err(err) => report("first_comment", &err),
    }

    println!("\nfinal user and post status:");
    match final_status(repo.conn()) {
        Ok(status) => {
            println!("article counts:");
            for user in &status.users {
                println!("- {}: {} posts", user.name, user.article_count);
            }
            println!("comment status:");
            for post in &status.posts {
                println!("- {}: {}", post.title, post.comment_status.as_db_str());
            }
        }
        Err(err) => report("final_status", &err),
    }

    match audit_counters(repo.conn()) {
        Ok(drifts) if drifts.is_empty() => println!("\ncounters consistent"),
        Ok(drifts) => {
            for drift in &drifts {
                println!("counter drift: {drift:?}");
            }
        }
        Err(err) => report("audit_counters", &err),
    }

    Ok(())
}

/// Creates the sample graph on an empty store and returns the first author.
fn seed_if_empty(repo: &mut SqliteBlogRepository<'_>) -> RepoResult<UserId> {
    let existing = repo.list_users(&UserListQuery {
        name: Some(FIRST_AUTHOR.to_string()),
        ..UserListQuery::default()
    })?;
    if let Some(user) = existing.first() {
        return Ok(user.id);
    }

    let zhang = repo.create_user(&NewUser::new(
        FIRST_AUTHOR,
        "zhangsan@example.com",
        "pass123",
    ))?;
    let li = repo.create_user(&NewUser::new("李四", "lisi@example.com", "pass456"))?;

    let go_intro = repo.create_post(&NewPost::new("Go语言入门", "Go语言基础教程...", zhang))?;
    let orm_guide = repo.create_post(&NewPost::new("GORM使用指南", "GORM高级技巧...", zhang))?;
    repo.create_post(&NewPost::new("Web开发实践", "使用Go开发Web应用...", li))?;

    repo.create_comment(&NewComment::new("好文章！", go_intro, li))?;
    repo.create_comment(&NewComment::new("学到了很多", go_intro, zhang))?;
    repo.create_comment(&NewComment::new("期待更多内容", orm_guide, li))?;

    println!("sample data created");
    Ok(zhang)
}

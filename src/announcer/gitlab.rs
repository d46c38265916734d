use std::fmt::Write;

use anyhow::Context;
use tracing::trace;
use url::Url;

use crate::{
    announcer::utils::shorten_content,
    webhooks::gitlab::{
        is_finished, AccessError, BuildEvent, Delivery, GitLabEvent, IssueEvent,
        MergeRequestEvent, NoteEvent, PipelineEvent, Project, PushEvent, User, WikiPageEvent,
    },
};

const SEPARATOR: &str = "⋅";

/// Builds the announcement for a delivery, `None` when it isn't worth one.
///
/// `gitlab_url` is used to build links for payloads that only carry a project path.
pub fn handle_gitlab_event(
    delivery: &Delivery,
    gitlab_url: Option<&Url>,
) -> anyhow::Result<Option<String>> {
    let tag = project_tag(&delivery.event);

    let message = match &delivery.event {
        GitLabEvent::Push(event) => handle_push(event, &tag)?,
        GitLabEvent::TagPush(event) => handle_tag_push(event, &tag)?,
        GitLabEvent::Issue(event) => handle_issue(event, &tag),
        GitLabEvent::MergeRequest(event) => handle_merge_request(event, &tag),
        GitLabEvent::Note(event) => handle_note(event, &tag),
        GitLabEvent::Pipeline(event) => handle_pipeline(event, &tag, gitlab_url)?,
        GitLabEvent::Build(event) => handle_build(event, &tag, gitlab_url)?,
        GitLabEvent::WikiPage(event) => handle_wiki_page(event, &tag),
    };

    Ok(message)
}

fn project_tag(event: &GitLabEvent) -> String {
    let name = event
        .project()
        .map(|project| project.name.as_str())
        .filter(|name| !name.is_empty())
        .or_else(|| event.push().and_then(|push| push.repository.name.as_deref()));

    format!("[{}]", name.unwrap_or("gitlab"))
}

fn user_handle(user: &Option<User>) -> &str {
    user.as_ref().map_or("someone", User::handle)
}

fn append_url(message: &mut String, url: Option<impl std::fmt::Display>) {
    if let Some(url) = url {
        write!(message, " {} {}", SEPARATOR, url).unwrap();
    }
}

fn handle_push(event: &PushEvent, tag: &str) -> anyhow::Result<Option<String>> {
    let branch = match event.branch() {
        Ok(branch) => branch,
        Err(e) => {
            trace!("not announcing push: {}", e);
            return Ok(None);
        }
    };

    let mut message = format!("{} {}", tag, event.username());

    if event.is_deletion() {
        write!(message, " deleted branch {}", branch).unwrap();
        return Ok(Some(message));
    }

    let count = event.total_commits();
    write!(
        message,
        " pushed {} commit{} to {}",
        count,
        if count == 1 { "" } else { "s" },
        branch
    )
    .unwrap();

    match event.head() {
        Ok(head) => {
            write!(message, ": {}", shorten_content(head.title())).unwrap();
            append_url(&mut message, head.url.as_deref());
        }
        // new branch pointing to an existing commit
        Err(AccessError::Empty) => append_url(&mut message, event.repository.ref_url(branch)),
        Err(e) => return Err(e.into()),
    }

    Ok(Some(message))
}

fn handle_tag_push(event: &PushEvent, tag: &str) -> anyhow::Result<Option<String>> {
    let name = event.tag().context("tag push without a tag ref")?;

    let mut message = format!("{} {}", tag, event.username());
    if event.is_deletion() {
        write!(message, " deleted tag {}", name).unwrap();
    } else {
        write!(message, " pushed tag {}", name).unwrap();
        append_url(&mut message, event.repository.ref_url(name));
    }

    Ok(Some(message))
}

/// Past tense of the `action` GitLab sends for issues, MRs and wiki pages.
fn describe_action(action: &str) -> Option<&'static str> {
    let description = match action {
        "open" => "opened",
        "close" => "closed",
        "reopen" => "reopened",
        "merge" => "merged",
        "approved" => "approved",
        "create" => "created",
        "delete" => "deleted",
        // too verbose, don't announce that
        "update" => return None,
        _ => {
            trace!("unknown action `{}`", action);
            return None;
        }
    };

    Some(description)
}

fn handle_issue(event: &IssueEvent, tag: &str) -> Option<String> {
    let issue = &event.object_attributes;
    let action = describe_action(issue.action.as_deref()?)?;

    let mut message = format!("{} {} {} issue {}", tag, user_handle(&event.user), action, issue);
    append_url(&mut message, issue.url.as_deref());

    Some(message)
}

fn handle_merge_request(event: &MergeRequestEvent, tag: &str) -> Option<String> {
    let mr = &event.object_attributes;
    let action = describe_action(mr.action.as_deref()?)?;

    let mut message = format!("{} {} {} MR {}", tag, user_handle(&event.user), action, mr);
    if let Some(source) = &mr.source_branch {
        write!(message, " {} → {}", source, mr.target_branch).unwrap();
    }
    append_url(&mut message, mr.url.as_deref());

    Some(message)
}

fn handle_note(event: &NoteEvent, tag: &str) -> Option<String> {
    let note = &event.object_attributes;

    let target = if let Some(issue) = &event.issue {
        format!("issue {}", issue)
    } else if let Some(mr) = &event.merge_request {
        format!("MR {}", mr)
    } else if let Some(commit) = &event.commit {
        format!("commit {}", commit.id.chars().take(8).collect::<String>())
    } else if let Some(snippet) = &event.snippet {
        format!("snippet ({})", shorten_content(&snippet.title))
    } else {
        note.noteable_type
            .clone()
            .unwrap_or_else(|| "something".to_owned())
    };

    let mut message = format!("{} {} commented on {}", tag, user_handle(&event.user), target);
    append_url(&mut message, note.url.as_deref());

    Some(message)
}

/// Link to a page of the project, falling back to the configured instance URL.
fn project_page(
    project: Option<&Project>,
    gitlab_url: Option<&Url>,
    page: &str,
) -> anyhow::Result<Option<Url>> {
    let project = match project {
        Some(project) => project,
        None => return Ok(None),
    };

    let base = match (&project.web_url, &project.path_with_namespace, gitlab_url) {
        (Some(web_url), _, _) => Url::parse(web_url)
            .with_context(|| format!("invalid project URL `{}`", web_url))?,
        (None, Some(path), Some(gitlab_url)) => under_instance(gitlab_url, path)
            .with_context(|| format!("couldn't build project URL for `{}`", path))?,
        _ => return Ok(None),
    };

    let url = Url::parse(&format!("{}/-/{}", base.as_str().trim_end_matches('/'), page))
        .with_context(|| format!("couldn't build URL for page `{}`", page))?;

    Ok(Some(url))
}

/// Joins `path` below the instance URL, keeping any subpath GitLab is served from.
fn under_instance(gitlab_url: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = gitlab_url.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join(path.trim_start_matches('/'))
}

fn handle_pipeline(
    event: &PipelineEvent,
    tag: &str,
    gitlab_url: Option<&Url>,
) -> anyhow::Result<Option<String>> {
    let pipeline = &event.object_attributes;
    let status = match pipeline.status.as_deref() {
        Some(status) if is_finished(status) => status,
        _ => return Ok(None),
    };

    let mut message = format!("{} pipeline", tag);
    if let Some(id) = pipeline.id {
        write!(message, " #{}", id).unwrap();
    }
    if let Some(r#ref) = &pipeline.r#ref {
        write!(message, " on {}", r#ref).unwrap();
    }
    write!(message, ": {}", status).unwrap();

    let failed: Vec<_> = event
        .failed_builds()
        .filter_map(|build| build.name.as_deref())
        .collect();
    if !failed.is_empty() {
        write!(message, " ({})", failed.join(", ")).unwrap();
    }

    if let Some(id) = pipeline.id {
        let page = format!("pipelines/{}", id);
        append_url(&mut message, project_page(event.project.as_ref(), gitlab_url, &page)?);
    }

    Ok(Some(message))
}

fn handle_build(
    event: &BuildEvent,
    tag: &str,
    gitlab_url: Option<&Url>,
) -> anyhow::Result<Option<String>> {
    let build = &event.object_attributes;
    let status = match build.status.as_deref() {
        Some(status) if is_finished(status) => status,
        _ => return Ok(None),
    };

    let mut message = format!("{} job {}", tag, build.name.as_deref().unwrap_or("?"));
    if let Some(stage) = &build.stage {
        write!(message, " ({})", stage).unwrap();
    }
    if let Some(r#ref) = &build.r#ref {
        write!(message, " on {}", r#ref).unwrap();
    }
    write!(message, ": {}", status).unwrap();

    if let Some(id) = build.id {
        let page = format!("jobs/{}", id);
        append_url(&mut message, project_page(event.project.as_ref(), gitlab_url, &page)?);
    }

    Ok(Some(message))
}

fn handle_wiki_page(event: &WikiPageEvent, tag: &str) -> Option<String> {
    let page = &event.object_attributes;
    let action = describe_action(page.action.as_deref()?)?;

    let mut message = format!(
        "{} {} {} wiki page {}",
        tag,
        user_handle(&event.user),
        action,
        shorten_content(&page.title)
    );
    append_url(&mut message, page.url.as_deref());

    Some(message)
}

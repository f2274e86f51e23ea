//! Shell scripts embedded in generated steps.
//!
//! Scripts take all variable input through step environment variables, so
//! none of them needs templating.

pub const CHECK_MEMBERSHIP: &str = r#"permission="$(gh api "repos/$GITHUB_REPOSITORY/collaborators/$GITHUB_ACTOR/permission" --jq .permission)"
case "$permission" in
  admin|maintain|write) member=true ;;
  *) member=false ;;
esac
echo "is_team_member=$member" >> "$GITHUB_OUTPUT""#;

pub const COMPUTE_TEXT: &str = r#"case "$GITHUB_EVENT_NAME" in
  issues) text="$(printf '%s\n\n%s' "$ISSUE_TITLE" "$ISSUE_BODY")" ;;
  pull_request) text="$(printf '%s\n\n%s' "$PR_TITLE" "$PR_BODY")" ;;
  issue_comment|pull_request_review_comment) text="$COMMENT_BODY" ;;
  *) text="" ;;
esac
{
  echo 'text<<AW_TEXT_EOF'
  echo "$text"
  echo 'AW_TEXT_EOF'
} >> "$GITHUB_OUTPUT""#;

pub const ADD_REACTION: &str = r#"case "$GITHUB_EVENT_NAME" in
  issues) endpoint="repos/$GITHUB_REPOSITORY/issues/$ISSUE_NUMBER/reactions" ;;
  issue_comment) endpoint="repos/$GITHUB_REPOSITORY/issues/comments/$COMMENT_ID/reactions" ;;
  pull_request) endpoint="repos/$GITHUB_REPOSITORY/issues/$PR_NUMBER/reactions" ;;
  pull_request_review_comment) endpoint="repos/$GITHUB_REPOSITORY/pulls/comments/$COMMENT_ID/reactions" ;;
  *) exit 0 ;;
esac
id="$(gh api "$endpoint" -f content="$REACTION" --jq .id)"
echo "reaction_id=$id" >> "$GITHUB_OUTPUT""#;

pub const COLLECT_OUTPUT: &str = r#"if [ -s "$GITHUB_AW_SAFE_OUTPUTS" ]; then
  {
    echo 'output<<AW_OUTPUT_EOF'
    cat "$GITHUB_AW_SAFE_OUTPUTS"
    echo 'AW_OUTPUT_EOF'
  } >> "$GITHUB_OUTPUT"
fi"#;

pub const GENERATE_PATCH: &str = r#"git format-patch "$GITHUB_SHA"..HEAD --stdout > /tmp/aw.patch
ls -l /tmp/aw.patch"#;

pub const CREATE_ISSUE: &str = r#"printf '%s\n' "$AGENT_OUTPUT" | jq -c 'select(.type == "create-issue")' | head -n "$MAX_ITEMS" | while read -r item; do
  title="$TITLE_PREFIX$(jq -r '.title' <<< "$item")"
  body="$(jq -r '.body' <<< "$item")"
  args=(--repo "$GITHUB_REPOSITORY" --title "$title" --body "$body")
  if [ -n "$LABELS" ]; then args+=(--label "$LABELS"); fi
  gh issue create "${args[@]}"
done"#;

pub const ADD_COMMENT: &str = r#"printf '%s\n' "$AGENT_OUTPUT" | jq -c 'select(.type == "add-issue-comment")' | head -n "$MAX_ITEMS" | while read -r item; do
  number="${TARGET_NUMBER:-$(jq -r '.issue_number' <<< "$item")}"
  gh issue comment "$number" --repo "$GITHUB_REPOSITORY" --body "$(jq -r '.body' <<< "$item")"
done"#;

pub const CREATE_PULL_REQUEST: &str = r#"item="$(printf '%s\n' "$AGENT_OUTPUT" | jq -c 'select(.type == "create-pull-request")' | head -n 1)"
if [ -z "$item" ] || [ ! -s /tmp/aw.patch ]; then
  echo "No pull request requested"
  exit 0
fi
branch="aw/$GITHUB_RUN_ID"
git config user.name "github-actions[bot]"
git config user.email "github-actions[bot]@users.noreply.github.com"
git checkout -b "$branch"
git am /tmp/aw.patch
git push origin "$branch"
title="$TITLE_PREFIX$(jq -r '.title' <<< "$item")"
args=(--repo "$GITHUB_REPOSITORY" --head "$branch" --title "$title" --body "$(jq -r '.body' <<< "$item")")
if [ "$DRAFT" = "true" ]; then args+=(--draft); fi
if [ -n "$LABELS" ]; then args+=(--label "$LABELS"); fi
gh pr create "${args[@]}""#;

pub const PUSH_TO_BRANCH: &str = r#"item="$(printf '%s\n' "$AGENT_OUTPUT" | jq -c 'select(.type == "push-to-pr-branch")' | head -n 1)"
if [ -z "$item" ] || [ ! -s /tmp/aw.patch ]; then
  echo "No push requested"
  exit 0
fi
number="${PR_NUMBER:-$(jq -r '.pull_number' <<< "$item")}"
gh pr checkout "$number"
git config user.name "github-actions[bot]"
git config user.email "github-actions[bot]@users.noreply.github.com"
git am /tmp/aw.patch
git push"#;

pub const ADD_LABELS: &str = r#"labels="$(printf '%s\n' "$AGENT_OUTPUT" | jq -r 'select(.type == "add-issue-labels") | .labels[]' | sort -u)"
if [ -n "$ALLOWED_LABELS" ]; then
  labels="$(printf '%s\n' "$labels" | grep -Fx -f <(printf '%s\n' "$ALLOWED_LABELS" | tr ',' '\n') || true)"
fi
labels="$(printf '%s\n' "$labels" | sed '/^$/d' | head -n "$MAX_ITEMS" | paste -sd, -)"
if [ -n "$labels" ]; then
  gh issue edit "$NUMBER" --repo "$GITHUB_REPOSITORY" --add-label "$labels"
fi"#;

use pretty_assertions::assert_eq;

use super::*;

fn create(title: &str, kind: &str, url: Option<&str>, color: Option<&str>) -> Command {
    Command::CreateDashboardWidget {
        widget_type: kind.to_string(),
        title: title.to_string(),
        content: None,
        url: url.map(str::to_string),
        target_time: None,
        color: color.map(str::to_string),
        data: None,
    }
}

#[tokio::test]
async fn known_site_title_gets_the_canonical_url_and_color() {
    let mut state = AppState::default();
    let store = StubStore::default();

    run(&mut state, &store, vec![create("Google", "card", None, None)]).await;

    let widget = &state.widgets.widgets[0];
    assert_eq!(widget.kind, "link");
    assert_eq!(widget.url.as_deref(), Some("https://www.google.com"));
    assert_eq!(widget.color, "blue");
}

#[tokio::test]
async fn url_substring_also_triggers_the_override() {
    let mut state = AppState::default();
    let store = StubStore::default();

    run(
        &mut state,
        &store,
        vec![create(
            "즐겨찾기",
            "link",
            Some("http://m.youtube.com/watch"),
            None,
        )],
    )
    .await;

    let widget = &state.widgets.widgets[0];
    assert_eq!(widget.url.as_deref(), Some("https://www.youtube.com"));
    assert_eq!(widget.color, "rose");
}

#[tokio::test]
async fn explicit_color_wins_over_the_override() {
    let mut state = AppState::default();
    let store = StubStore::default();

    run(
        &mut state,
        &store,
        vec![create("Naver", "link", None, Some("amber"))],
    )
    .await;

    assert_eq!(state.widgets.widgets[0].color, "amber");
}

#[tokio::test]
async fn plain_cards_default_to_indigo_with_a_fresh_id() {
    let mut state = AppState::default();
    let store = StubStore::default();

    let outcome = run(
        &mut state,
        &store,
        vec![create("Today's Quote", "card", None, None)],
    )
    .await;

    let widget = &state.widgets.widgets[0];
    assert_eq!(widget.kind, "card");
    assert_eq!(widget.color, "indigo");
    assert!(!widget.id.is_empty());
    assert_eq!(
        outcome.replies,
        vec!["Added widget \"Today's Quote\".".to_string()]
    );
    assert_eq!(outcome.effects, vec![Effect::SaveDomain(DomainKey::Widgets)]);
}

#[tokio::test]
async fn fuzzy_delete_matches_normalized_substrings_in_either_direction() {
    let mut state = AppState::default();
    state
        .widgets
        .widgets
        .push(widget("w1", "link", "구글지도 바로가기"));
    let store = StubStore::default();

    let outcome = run(
        &mut state,
        &store,
        vec![Command::DeleteDashboardWidget {
            title: "구글지도".to_string(),
        }],
    )
    .await;

    assert!(state.widgets.widgets.is_empty());
    assert_eq!(
        outcome.replies,
        vec!["Removed widget \"구글지도 바로가기\".".to_string()]
    );
}

#[tokio::test]
async fn first_match_wins_when_two_widgets_share_a_substring() {
    let mut state = AppState::default();
    state.widgets.widgets.push(widget("w1", "link", "구글지도"));
    state
        .widgets
        .widgets
        .push(widget("w2", "link", "구글 캘린더"));
    let store = StubStore::default();

    run(
        &mut state,
        &store,
        vec![Command::DeleteDashboardWidget {
            title: "구글".to_string(),
        }],
    )
    .await;

    assert_eq!(state.widgets.widgets.len(), 1);
    assert_eq!(state.widgets.widgets[0].id, "w2");
}

#[tokio::test]
async fn unrelated_titles_do_not_match() {
    let mut state = AppState::default();
    state.widgets.widgets.push(widget("w1", "card", "환율 정보"));
    let store = StubStore::default();

    let outcome = run(
        &mut state,
        &store,
        vec![Command::DeleteDashboardWidget {
            title: "구글".to_string(),
        }],
    )
    .await;

    assert_eq!(state.widgets.widgets.len(), 1);
    assert_eq!(
        outcome.replies,
        vec!["No widget matching \"구글\". Current widgets: 환율 정보".to_string()]
    );
}

#[tokio::test]
async fn show_widgets_filters_by_kind_and_suppresses_the_text_reply() {
    let mut state = AppState::default();
    state.widgets.widgets.push(widget("w1", "card", "Quote"));
    state.widgets.widgets.push(widget("w2", "link", "Google"));
    let store = StubStore::default();

    let outcome = run(
        &mut state,
        &store,
        vec![Command::ShowDashboardWidgets {
            widget_type: "link".to_string(),
        }],
    )
    .await;

    assert_eq!(outcome.replies, Vec::<String>::new());
    assert_eq!(outcome.reply_text(), None);
    match outcome.effects.as_slice() {
        [Effect::ShowWidgets(listed)] => {
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0].id, "w2");
        }
        other => panic!("expected widget payload, got {other:?}"),
    }
}

#[tokio::test]
async fn show_all_lists_everything() {
    let mut state = AppState::default();
    state.widgets.widgets.push(widget("w1", "card", "Quote"));
    state.widgets.widgets.push(widget("w2", "link", "Google"));
    let store = StubStore::default();

    let outcome = run(
        &mut state,
        &store,
        vec![Command::ShowDashboardWidgets {
            widget_type: "all".to_string(),
        }],
    )
    .await;

    match outcome.effects.as_slice() {
        [Effect::ShowWidgets(listed)] => assert_eq!(listed.len(), 2),
        other => panic!("expected widget payload, got {other:?}"),
    }
}

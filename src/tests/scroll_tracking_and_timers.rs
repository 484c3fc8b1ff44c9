use super::*;

// Two tall sections under a generated Contents block. With the nav
// occupying 0..60, the section boxes land at 60..260 and 660..860 and
// the document is 1360 tall, so max scroll against the 600px viewport
// is 760.
fn section_page() -> &'static str {
    r#"
    <div class='container-narrow'>
      <div class='scribe-container'>
        <h3 class='scribe-section' style='height: 200px'>Alpha Part</h3>
        <div style='height: 400px'>first body</div>
        <h3 class='scribe-section' style='height: 200px'>Beta Part</h3>
        <div style='height: 500px'>second body</div>
      </div>
    </div>
    "#
}

#[test]
fn initial_pass_marks_the_section_under_the_band() -> Result<()> {
    let page = Page::from_html(section_page())?;
    assert!(page.has_class("a[href='#alpha-part']", "active")?);
    assert!(!page.has_class("a[href='#beta-part']", "active")?);
    Ok(())
}

#[test]
fn the_band_check_point_sits_on_the_bottom_edge_exclusively() -> Result<()> {
    let mut page = Page::from_html(section_page())?;

    // Alpha's box is 60..260, so at 159 its bottom is one pixel past
    // the 100px check point and the section still counts.
    page.scroll_to(159)?;
    page.advance_time(50)?;
    assert!(page.has_class("a[href='#alpha-part']", "active")?);

    // One more pixel puts the bottom exactly on the check point.
    page.scroll_to(160)?;
    page.advance_time(50)?;
    assert!(!page.has_class("a[href='#alpha-part']", "active")?);
    assert!(!page.has_class("a[href='#beta-part']", "active")?);
    Ok(())
}

#[test]
fn nav_click_scrolls_with_clearance_and_rewrites_fragment() -> Result<()> {
    let mut page = Page::from_html(section_page())?;
    page.click("a[href='#beta-part']")?;

    assert_eq!(page.scroll_y(), 640);
    assert_eq!(page.location_hash(), "#beta-part");

    let records = page.navigations();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, NavigationKind::Replace);
    assert!(records[0].to.ends_with("#beta-part"));
    Ok(())
}

#[test]
fn scroll_bursts_collapse_into_one_trailing_recompute() -> Result<()> {
    let mut page = Page::from_html(section_page())?;
    page.scroll_to(150)?;
    page.scroll_to(300)?;
    page.scroll_to(620)?;

    let pending = page.pending_timers();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, 3);
    assert_eq!(pending[0].due_at, 50);
    assert_eq!(pending[0].key, Some(TimerKey::ScrollSpy));

    // One tick short of the quiet window: the marks are still the ones
    // from the load-time pass.
    page.advance_time(49)?;
    assert!(page.has_class("a[href='#alpha-part']", "active")?);

    page.advance_time(1)?;
    assert!(!page.has_class("a[href='#alpha-part']", "active")?);
    assert!(page.has_class("a[href='#beta-part']", "active")?);
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn last_id_in_document_order_wins_the_band() -> Result<()> {
    let html = r#"
    <div class='container-narrow'>
      <div class='scribe-container'>
        <div id='wrap' style='height: 400px'>
          <h3 class='scribe-section' style='height: 200px'>Gamma</h3>
        </div>
        <h3 class='scribe-section' style='height: 200px'>Delta</h3>
        <div style='height: 600px'>tail</div>
      </div>
    </div>
    "#;

    let mut page = Page::from_html(html)?;
    // Both #wrap and the nested #gamma straddle the band at load; the
    // nested section comes later in document order and takes the mark.
    assert!(page.has_class("a[href='#gamma']", "active")?);

    // Past 160 only #wrap straddles, and #wrap has no Contents link,
    // so every link goes dark.
    page.scroll_to(200)?;
    page.advance_time(50)?;
    assert!(!page.has_class("a[href='#gamma']", "active")?);
    assert!(!page.has_class("a[href='#delta']", "active")?);
    Ok(())
}

#[test]
fn pages_without_navigation_never_arm_the_spy() -> Result<()> {
    let html = "<div style='height: 2000px'>tall block</div>";
    let mut page = Page::from_html(html)?;
    assert!(page.nav_entries().is_empty());

    page.scroll_to(300)?;
    assert_eq!(page.scroll_y(), 300);
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn scroll_positions_clamp_to_the_document() -> Result<()> {
    let mut page = Page::from_html(section_page())?;
    page.scroll_to(100_000)?;
    assert_eq!(page.scroll_y(), 760);
    page.flush()?;

    // Same clamped position again: no movement, no event, no timer.
    page.scroll_to(100_000)?;
    assert!(page.pending_timers().is_empty());

    page.scroll_to(-5)?;
    assert_eq!(page.scroll_y(), 0);
    assert_eq!(page.pending_timers().len(), 1);
    Ok(())
}

#[test]
fn cleared_timers_do_not_run() -> Result<()> {
    let mut page = Page::from_html(section_page())?;
    page.scroll_to(200)?;
    let pending = page.pending_timers();
    assert_eq!(pending.len(), 1);

    page.clear_timer(pending[0].id);
    assert!(page.pending_timers().is_empty());
    page.advance_time(50)?;
    // The recompute never ran, so the load-time mark survives even
    // though alpha has left the band.
    assert!(page.has_class("a[href='#alpha-part']", "active")?);

    page.scroll_to(300)?;
    page.clear_all_timers();
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn flush_runs_pending_work_and_moves_the_clock() -> Result<()> {
    let mut page = Page::from_html(section_page())?;
    page.scroll_to(620)?;
    assert_eq!(page.now_ms(), 0);

    page.flush()?;
    assert_eq!(page.now_ms(), 50);
    assert!(page.has_class("a[href='#beta-part']", "active")?);
    assert!(page.pending_timers().is_empty());

    // Absolute targets in the past are a no-op.
    page.advance_time_to(40)?;
    assert_eq!(page.now_ms(), 50);
    page.advance_time(100)?;
    assert_eq!(page.now_ms(), 150);
    Ok(())
}

#[test]
fn the_step_limit_stops_runaway_timer_chains() -> Result<()> {
    let mut page = Page::from_html(section_page())?;
    page.set_timer_step_limit(2);
    for delay in [10, 20, 30] {
        page.scheduler
            .schedule(delay, None, Action::ScrollSpyRecompute);
    }

    match page.flush() {
        Err(Error::Runtime(msg)) => assert!(msg.contains("timer step limit")),
        other => panic!("expected the step limit to trip, got: {other:?}"),
    }
    Ok(())
}

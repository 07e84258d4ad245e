//! Proportional scroll synchronization between the editor and the preview.
//!
//! Each pane's position is reduced to a proportion
//! `p = scroll_top / (scroll_height - client_height)`, clamped to `[0, 1]`
//! (a pane with nothing to scroll is `p = 0`). A user scroll on one pane
//! yields a [`ScrollCommand`] positioning the other pane at the same
//! proportion. The resulting programmatic scroll event is swallowed by a
//! [`SuppressEcho`] guard until [`ScrollSync::on_frame`].

use crate::echo::SuppressEcho;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    Editor,
    Preview,
}

impl Pane {
    pub fn other(self) -> Pane {
        match self {
            Pane::Editor => Pane::Preview,
            Pane::Preview => Pane::Editor,
        }
    }
}

/// Scroll geometry of one pane, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaneMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl PaneMetrics {
    pub fn new(scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top: 0.0,
            scroll_height,
            client_height,
        }
    }

    fn range(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    pub fn proportion(&self) -> f64 {
        let range = self.range();
        if range <= 0.0 || !self.scroll_top.is_finite() {
            return 0.0;
        }
        (self.scroll_top / range).clamp(0.0, 1.0)
    }

    /// `scroll_top` that places this pane at proportion `p`.
    pub fn offset_for(&self, p: f64) -> f64 {
        p.clamp(0.0, 1.0) * self.range()
    }
}

/// Instruction for the host to scroll `pane` to `scroll_top`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollCommand {
    pub pane: Pane,
    pub scroll_top: f64,
}

#[derive(Debug, Default)]
pub struct ScrollSync {
    editor: PaneMetrics,
    preview: PaneMetrics,
    echo: SuppressEcho,
}

impl ScrollSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self, pane: Pane) -> PaneMetrics {
        match pane {
            Pane::Editor => self.editor,
            Pane::Preview => self.preview,
        }
    }

    fn metrics_mut(&mut self, pane: Pane) -> &mut PaneMetrics {
        match pane {
            Pane::Editor => &mut self.editor,
            Pane::Preview => &mut self.preview,
        }
    }

    /// Record new content/viewport heights for `pane` (after a render or a
    /// window resize). The current scroll offset is kept.
    pub fn resize(&mut self, pane: Pane, scroll_height: f64, client_height: f64) {
        let m = self.metrics_mut(pane);
        m.scroll_height = scroll_height;
        m.client_height = client_height;
    }

    /// Handle a scroll event reported by `pane`.
    ///
    /// Returns the command for the opposite pane, or `None` when the event
    /// is the echo of a sync applied earlier in this frame.
    pub fn on_scroll(&mut self, pane: Pane, scroll_top: f64) -> Option<ScrollCommand> {
        self.metrics_mut(pane).scroll_top = scroll_top;
        let p = self.metrics(pane).proportion();
        let target = pane.other();
        let offset = self.metrics(target).offset_for(p);
        let mut echo = self.echo;
        let command = echo.propagate(|| {
            self.metrics_mut(target).scroll_top = offset;
            ScrollCommand {
                pane: target,
                scroll_top: offset,
            }
        });
        self.echo = echo;
        command
    }

    pub fn is_syncing(&self) -> bool {
        self.echo.is_engaged()
    }

    /// Next animation frame: programmatic scrolls from the previous frame
    /// have landed, so user scrolls are accepted again.
    pub fn on_frame(&mut self) {
        self.echo.on_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync() -> ScrollSync {
        let mut s = ScrollSync::new();
        s.resize(Pane::Editor, 1_000.0, 200.0);
        s.resize(Pane::Preview, 3_000.0, 500.0);
        s
    }

    #[test]
    fn proportion_maps_across_panes() {
        let mut s = sync();
        let cmd = s.on_scroll(Pane::Editor, 400.0).unwrap();
        assert_eq!(cmd.pane, Pane::Preview);
        assert_eq!(cmd.scroll_top, 1_250.0);
        assert_eq!(s.metrics(Pane::Preview).proportion(), 0.5);
    }

    #[test]
    fn programmatic_scroll_does_not_cascade() {
        let mut s = sync();
        let cmd = s.on_scroll(Pane::Editor, 400.0).unwrap();
        // host applies the command; the preview reports it back
        assert_eq!(s.on_scroll(cmd.pane, cmd.scroll_top), None);
        assert_eq!(s.metrics(Pane::Editor).scroll_top, 400.0);
        s.on_frame();
        let back = s.on_scroll(Pane::Preview, 2_500.0).unwrap();
        assert_eq!(back.pane, Pane::Editor);
        assert_eq!(back.scroll_top, 800.0);
    }

    #[test]
    fn zero_height_pane_is_at_top() {
        let m = PaneMetrics::new(100.0, 100.0);
        assert_eq!(m.proportion(), 0.0);
        let mut s = ScrollSync::new();
        s.resize(Pane::Preview, 2_000.0, 1_000.0);
        let cmd = s.on_scroll(Pane::Editor, 50.0).unwrap();
        assert_eq!(cmd.scroll_top, 0.0);
    }

    #[test]
    fn proportion_is_clamped() {
        let mut m = PaneMetrics::new(1_000.0, 200.0);
        m.scroll_top = 5_000.0;
        assert_eq!(m.proportion(), 1.0);
        m.scroll_top = -10.0;
        assert_eq!(m.proportion(), 0.0);
    }
}

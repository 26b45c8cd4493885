//! Per-graphic stroke reveal state machine.
//!
//! One [`StrokeReveal`] drives the progressive draw-in of a single decomposed shape:
//! `Idle -> Delaying -> Revealing(i) -> Done`. It is advanced cooperatively by the
//! playback clock (`tick`), never by its own thread, so "concurrent" graphics in a row
//! are just several state machines advanced on the same tick.

/// Small epsilon absorbing floating-point drift when a tick lands exactly on a stroke
/// boundary, keeping nominal tick counts stable.
const TICK_EPS: f64 = 1e-9;

/// Reveal lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPhase {
    Idle,
    Delaying,
    /// Animating the stroke at this index; earlier strokes are fully drawn.
    Revealing(usize),
    Done,
    /// Terminal state entered through [`StrokeReveal::cancel`]; never fires completion.
    Cancelled,
}

/// Events surfaced by [`StrokeReveal::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealEvent {
    /// The reveal reached `Done`. Returned exactly once per reveal.
    Completed,
}

/// Render snapshot of a reveal: how many leading strokes are fully drawn plus the
/// in-progress stroke's drawn fraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealFrame {
    /// Strokes `0..completed` are fully drawn.
    pub completed: usize,
    /// `(stroke index, drawn fraction in [0,1])` of the currently animating stroke.
    pub active: Option<(usize, f64)>,
}

/// Time-driven reveal of an ordered stroke list.
///
/// Each stroke receives an equal share of the configured duration. Drawn fractions are
/// monotonic: once a stroke reaches 1.0 it never regresses, and leftover tick time rolls
/// into the next stroke so total reveal time stays within one tick of `delay + duration`.
#[derive(Debug, Clone)]
pub struct StrokeReveal {
    stroke_count: usize,
    per_stroke_secs: f64,
    remaining_delay: f64,
    fraction: f64,
    phase: RevealPhase,
}

impl StrokeReveal {
    pub fn new(stroke_count: usize, delay_secs: f64, duration_secs: f64) -> Self {
        let per_stroke_secs = if stroke_count > 0 {
            duration_secs.max(0.0) / stroke_count as f64
        } else {
            0.0
        };
        Self {
            stroke_count,
            per_stroke_secs,
            remaining_delay: delay_secs.max(0.0),
            fraction: 0.0,
            phase: RevealPhase::Idle,
        }
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == RevealPhase::Done
    }

    /// `Idle -> Delaying`. Ticking an idle reveal starts it implicitly.
    pub fn start(&mut self) {
        if self.phase == RevealPhase::Idle {
            self.phase = RevealPhase::Delaying;
        }
    }

    /// Stop producing updates. After cancellation, `tick` is a no-op and the completion
    /// event is never fired, even if the reveal was one tick away from finishing.
    pub fn cancel(&mut self) {
        if self.phase != RevealPhase::Done {
            self.phase = RevealPhase::Cancelled;
        }
    }

    /// Advance the reveal by `dt` seconds of timeline time.
    pub fn tick(&mut self, dt: f64) -> Option<RevealEvent> {
        let mut budget = dt.max(0.0);
        loop {
            match self.phase {
                RevealPhase::Idle => {
                    self.phase = RevealPhase::Delaying;
                }
                RevealPhase::Delaying => {
                    if budget + TICK_EPS < self.remaining_delay {
                        self.remaining_delay -= budget;
                        return None;
                    }
                    budget = (budget - self.remaining_delay).max(0.0);
                    self.remaining_delay = 0.0;
                    if self.stroke_count == 0 {
                        self.phase = RevealPhase::Done;
                        return Some(RevealEvent::Completed);
                    }
                    self.phase = RevealPhase::Revealing(0);
                    self.fraction = 0.0;
                }
                RevealPhase::Revealing(i) => {
                    let remaining = (1.0 - self.fraction) * self.per_stroke_secs;
                    if budget + TICK_EPS < remaining {
                        self.fraction += budget / self.per_stroke_secs;
                        self.fraction = self.fraction.min(1.0);
                        return None;
                    }
                    budget = (budget - remaining).max(0.0);
                    self.fraction = 1.0;
                    if i + 1 < self.stroke_count {
                        self.phase = RevealPhase::Revealing(i + 1);
                        self.fraction = 0.0;
                    } else {
                        self.phase = RevealPhase::Done;
                        return Some(RevealEvent::Completed);
                    }
                }
                RevealPhase::Done | RevealPhase::Cancelled => return None,
            }
        }
    }

    /// Current render snapshot.
    pub fn frame(&self) -> RevealFrame {
        match self.phase {
            RevealPhase::Idle | RevealPhase::Delaying => RevealFrame {
                completed: 0,
                active: None,
            },
            RevealPhase::Revealing(i) => RevealFrame {
                completed: i,
                active: Some((i, self.fraction)),
            },
            RevealPhase::Done => RevealFrame {
                completed: self.stroke_count,
                active: None,
            },
            RevealPhase::Cancelled => RevealFrame {
                completed: 0,
                active: None,
            },
        }
    }
}

use std::{
    collections::VecDeque,
    ops::Range,
    sync::atomic::{AtomicBool, Ordering},
};

use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    darkness::{Darkness, DarknessMode, FlatDarkness, PercentageDarkness},
    error::{Error, Result},
    pins::Pin,
    result::StringArtResult,
    sampler::LineSampler,
    verboser::{Message, Silent, Verboser},
    DarknessField, Float,
};

pub const DEFAULT_EXCLUSION_WINDOW: usize = 2;
pub const DEFAULT_MAX_REPEATS_PER_EDGE: usize = 1;
pub const DEFAULT_INK_WEIGHT: f64 = 0.25;
pub const DEFAULT_TERMINATION_THRESHOLD: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "S: Float + serde::Deserialize<'de>"))]
pub struct Options<S> {
    /// Pins visited right before the current one that can not be chosen next.
    pub exclusion_window: usize,
    /// Times a chord between the same two pins may be drawn. `None` is unlimited.
    pub max_repeats_per_edge: Option<usize>,
    /// Ink removed from every cell under a drawn chord.
    pub ink_weight: S,
    /// The run stops once the best chord scores at or below this value.
    pub termination_threshold: S,
    pub darkness_mode: DarknessMode,
    /// Pins this close to the current one, counted around the layout, are skipped.
    pub min_pin_distance: usize,
}

impl<S: Float> Default for Options<S> {
    fn default() -> Self {
        Self {
            exclusion_window: DEFAULT_EXCLUSION_WINDOW,
            max_repeats_per_edge: Some(DEFAULT_MAX_REPEATS_PER_EDGE),
            ink_weight: S::from_f64(DEFAULT_INK_WEIGHT),
            termination_threshold: S::from_f64(DEFAULT_TERMINATION_THRESHOLD),
            darkness_mode: DarknessMode::default(),
            min_pin_distance: 0,
        }
    }
}

impl<S: Float> Options<S> {
    pub fn validate(&self) -> Result<()> {
        if !self.ink_weight.is_finite() || self.ink_weight < S::ZERO || self.ink_weight > S::ONE {
            return Err(Error::parameter(format!(
                "ink weight must be within [0, 1], got {}",
                self.ink_weight
            )));
        }
        if !self.termination_threshold.is_finite() {
            return Err(Error::parameter(format!(
                "termination threshold must be finite, got {}",
                self.termination_threshold
            )));
        }
        if self.max_repeats_per_edge == Some(0) {
            return Err(Error::parameter(
                "max repeats per edge must be at least 1, leave it unset for no limit",
            ));
        }
        Ok(())
    }

    fn darkness(&self) -> Box<dyn Darkness<S>> {
        match self.darkness_mode {
            DarknessMode::Flat => Box::new(FlatDarkness(self.ink_weight)),
            DarknessMode::Percentage => Box::new(PercentageDarkness(S::ONE - self.ink_weight)),
        }
    }
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Every requested chord was drawn.
    Completed,
    /// The best chord left scored at or below the termination threshold.
    NoInkRemaining,
    /// Every pin was excluded from the current one.
    NoCandidates,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Far end of the chord just drawn.
    Chose(usize),
    Finished(Termination),
}

#[derive(Clone, Copy, Debug)]
struct Candidate<S> {
    pin: usize,
    score: S,
}

struct BatchBuffer<S> {
    range: Range<usize>,
    result: Option<Candidate<S>>,
}

impl<S> BatchBuffer<S> {
    fn new() -> Vec<Self> {
        Self::with_count(num_cpus::get())
    }

    fn with_count(count: usize) -> Vec<Self> {
        (0..count.max(1))
            .map(|_| Self {
                range: 0..0,
                result: None,
            })
            .collect()
    }
}

/// Use counter for every unordered pair of pins.
struct EdgeUsage(Vec<usize>);

impl EdgeUsage {
    fn new(pin_count: usize) -> Self {
        Self(vec![0; pin_count * pin_count.saturating_sub(1) / 2])
    }

    // a != b
    fn index_of(a: usize, b: usize) -> usize {
        let (big, small) = if a > b { (a, b) } else { (b, a) };
        big * (big - 1) / 2 + small
    }

    fn get(&self, a: usize, b: usize) -> usize {
        self.0[Self::index_of(a, b)]
    }

    fn mark(&mut self, a: usize, b: usize) {
        self.0[Self::index_of(a, b)] += 1;
    }
}

struct Rules<'a, S> {
    current: usize,
    pin_count: usize,
    recent: &'a VecDeque<usize>,
    edges: &'a EdgeUsage,
    options: &'a Options<S>,
}

impl<S> Rules<'_, S> {
    fn allows(&self, to: usize) -> bool {
        if to == self.current || self.recent.contains(&to) {
            return false;
        }
        let diff = self.current.abs_diff(to);
        if diff.min(self.pin_count - diff) <= self.options.min_pin_distance {
            return false;
        }
        self.options
            .max_repeats_per_edge
            .map_or(true, |cap| self.edges.get(self.current, to) < cap)
    }
}

/// One generation run. Owns its working copy of the field.
///
/// Every step scores the chords towards the eligible pins in parallel, draws
/// the darkest one and removes its ink.
pub struct Sequencer<'p, S> {
    pins: &'p [Pin<S>],
    field: DarknessField<S>,
    options: Options<S>,
    darkness: Box<dyn Darkness<S>>,
    edges: EdgeUsage,
    recent: VecDeque<usize>,
    start_pin: usize,
    current: usize,
    line_count: usize,
    sequence: Vec<usize>,
    buffers: Vec<BatchBuffer<S>>,
    termination: Option<Termination>,
}

impl<'p, S: Float> Sequencer<'p, S> {
    pub fn new(
        pins: &'p [Pin<S>],
        field: DarknessField<S>,
        start_pin: usize,
        line_count: usize,
        options: Options<S>,
    ) -> Result<Self> {
        if pins.len() < 2 {
            return Err(Error::parameter(format!(
                "at least 2 pins are needed, got {}",
                pins.len()
            )));
        }
        if let Some((position, pin)) = pins
            .iter()
            .enumerate()
            .find(|(position, pin)| pin.index != *position)
        {
            return Err(Error::parameter(format!(
                "pin at position {position} has index {}",
                pin.index
            )));
        }
        if let Some(pin) = pins
            .iter()
            .find(|pin| !pin.position.x.is_finite() || !pin.position.y.is_finite())
        {
            return Err(Error::parameter(format!(
                "pin {} is at a non finite position",
                pin.index
            )));
        }
        if start_pin >= pins.len() {
            return Err(Error::parameter(format!(
                "start pin {start_pin} is out of range for {} pins",
                pins.len()
            )));
        }
        options.validate()?;
        // A window of N already excludes every other pin.
        let options = Options {
            exclusion_window: options.exclusion_window.min(pins.len()),
            ..options
        };

        Ok(Self {
            pins,
            field,
            darkness: options.darkness(),
            options,
            edges: EdgeUsage::new(pins.len()),
            recent: VecDeque::with_capacity(options.exclusion_window + 1),
            start_pin,
            current: start_pin,
            line_count,
            sequence: Vec::with_capacity(line_count.min(1 << 16)),
            buffers: BatchBuffer::new(),
            termination: None,
        })
    }

    /// The working field, with the ink of every chord drawn so far removed.
    pub fn field(&self) -> &DarknessField<S> {
        &self.field
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn current_pin(&self) -> usize {
        self.current
    }

    /// Runs one iteration. Once finished every further call returns the same
    /// [`Step::Finished`].
    pub fn step(&mut self) -> Step {
        if let Some(termination) = self.termination {
            return Step::Finished(termination);
        }
        if self.sequence.len() >= self.line_count {
            return self.stop(Termination::Completed);
        }
        match self.best_candidate() {
            None => self.stop(Termination::NoCandidates),
            Some(best) if best.score <= self.options.termination_threshold => {
                tracing::debug!(
                    "Best chord from pin {} to {} scores {}, no ink left.",
                    self.current,
                    best.pin,
                    best.score
                );
                self.stop(Termination::NoInkRemaining)
            }
            Some(best) => {
                self.accept(best);
                Step::Chose(best.pin)
            }
        }
    }

    /// Stops the run unless it already finished. The sequence drawn so far is kept.
    pub fn cancel(&mut self) {
        if self.termination.is_none() && self.sequence.len() < self.line_count {
            self.termination = Some(Termination::Cancelled);
        }
    }

    pub fn run(
        mut self,
        cancel: &AtomicBool,
        verboser: &mut impl Verboser,
    ) -> StringArtResult {
        tracing::info!(
            "Sequencing up to {} chords over {} pins from pin {}.",
            self.line_count,
            self.pins.len(),
            self.start_pin
        );
        loop {
            if cancel.load(Ordering::Relaxed) {
                self.cancel();
            }
            verboser.verbose(Message::Computing(self.sequence.len()));
            if let Step::Finished(_) = self.step() {
                break;
            }
        }
        let result = self.finish();
        tracing::info!(
            "Sequenced {} of {} chords ({:?}).",
            result.sequence.len(),
            result.requested,
            result.termination
        );
        result
    }

    pub fn finish(self) -> StringArtResult {
        let termination = self.termination.unwrap_or(if self.sequence.len() >= self.line_count {
            Termination::Completed
        } else {
            Termination::Cancelled
        });
        StringArtResult {
            start_pin: self.start_pin,
            sequence: self.sequence,
            requested: self.line_count,
            termination,
        }
    }

    fn stop(&mut self, termination: Termination) -> Step {
        self.termination = Some(termination);
        Step::Finished(termination)
    }

    fn accept(&mut self, best: Candidate<S>) {
        let from = self.pins[self.current].position;
        let to = self.pins[best.pin].position;
        let cells: Vec<usize> = LineSampler::new(&self.field).cells(from, to).collect();
        self.field.remove_ink(&cells, &*self.darkness);
        self.edges.mark(self.current, best.pin);

        if self.options.exclusion_window > 0 {
            self.recent.push_back(self.current);
            while self.recent.len() > self.options.exclusion_window {
                self.recent.pop_front();
            }
        }
        self.current = best.pin;
        self.sequence.push(best.pin);
    }

    /// Highest scoring eligible pin, the smallest index winning ties.
    fn best_candidate(&mut self) -> Option<Candidate<S>> {
        let pin_count = self.pins.len();
        let chunk_size = pin_count.div_ceil(self.buffers.len());
        for (index, buffer) in self.buffers.iter_mut().enumerate() {
            let start = (index * chunk_size).min(pin_count);
            buffer.range = start..(start + chunk_size).min(pin_count);
        }

        let rules = Rules {
            current: self.current,
            pin_count,
            recent: &self.recent,
            edges: &self.edges,
            options: &self.options,
        };
        let sampler = LineSampler::new(&self.field);
        let pins = self.pins;
        let from = pins[self.current].position;

        self.buffers.par_iter_mut().for_each(|buffer| {
            buffer.result = None;
            for to in buffer.range.clone() {
                if !rules.allows(to) {
                    continue;
                }
                let score = sampler.score(from, pins[to].position);
                if buffer.result.map_or(true, |best| score > best.score) {
                    buffer.result = Some(Candidate { pin: to, score });
                }
            }
        });

        // Buffers cover increasing pin ranges, so keeping the first maximum
        // keeps the smallest index.
        self.buffers
            .iter()
            .filter_map(|buffer| buffer.result)
            .fold(None, |best: Option<Candidate<S>>, candidate| match best {
                Some(best) if best.score >= candidate.score => Some(best),
                _ => Some(candidate),
            })
    }
}

/// Sequences up to `line_count` chords over a copy of `field`.
pub fn generate_sequence<S: Float>(
    pins: &[Pin<S>],
    field: &DarknessField<S>,
    start_pin: usize,
    line_count: usize,
    options: &Options<S>,
) -> Result<StringArtResult> {
    generate_sequence_with(
        pins,
        field.clone(),
        start_pin,
        line_count,
        options,
        &AtomicBool::new(false),
        &mut Silent,
    )
}

/// Like [`generate_sequence`], consuming `field` as the working copy.
///
/// `cancel` is checked between iterations; a cancelled run returns the
/// chords drawn so far.
pub fn generate_sequence_with<S: Float>(
    pins: &[Pin<S>],
    field: DarknessField<S>,
    start_pin: usize,
    line_count: usize,
    options: &Options<S>,
    cancel: &AtomicBool,
    verboser: &mut impl Verboser,
) -> Result<StringArtResult> {
    Ok(Sequencer::new(pins, field, start_pin, line_count, *options)?.run(cancel, verboser))
}

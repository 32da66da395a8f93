#![forbid(unsafe_code)]

//! Horizontal strips of independently windowed sections.
//!
//! [`SectionStrip`] lays sections side by side along one axis and forwards
//! horizontal scrolling to them: sections outside the viewport are hidden
//! wholesale, sections intersecting it receive their visible slice in local
//! coordinates. Tiny scrollbar jitter is suppressed below a configurable
//! pixel delta so sections are not re-windowed on every event.

/// One member of a [`SectionStrip`]; typically wraps a windowing controller.
pub trait Section {
    /// Full pixel width of the section.
    fn width(&self) -> f64;

    /// Full pixel height of the section.
    fn height(&self) -> f64;

    /// Called once when the section joins a strip.
    fn init(&mut self) {}

    /// The section intersects the viewport. `left` and `width` describe the
    /// visible slice in the section's own coordinates; `going_right` tells
    /// which way the viewport moved.
    fn show(&mut self, left: f64, width: f64, going_right: bool);

    /// The section left the viewport entirely.
    fn hide(&mut self);

    /// New horizontal position within the strip.
    fn set_offset(&mut self, _left: f64) {}
}

/// Layout and scroll tuning for a [`SectionStrip`].
#[derive(Debug, Clone, Copy)]
pub struct StripOptions {
    /// Gap between adjacent sections.
    pub column_padding: f64,
    /// Scroll deltas below this many pixels are ignored.
    pub min_scroll_delta: f64,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            column_padding: 0.0,
            min_scroll_delta: 30.0,
        }
    }
}

/// Side-by-side section manager with scroll fan-out.
pub struct SectionStrip {
    sections: Vec<Box<dyn Section>>,
    options: StripOptions,
    last_left: f64,
    last_width: f64,
}

impl SectionStrip {
    #[must_use]
    pub fn new(options: StripOptions) -> Self {
        Self {
            sections: Vec::new(),
            options,
            last_left: 0.0,
            last_width: 0.0,
        }
    }

    /// Appends a section, initializes it and re-lays the strip out.
    /// Returns the section's index.
    pub fn push<S: Section + 'static>(&mut self, section: S) -> usize {
        let mut boxed = Box::new(section);
        boxed.init();
        self.sections.push(boxed);
        self.update();
        self.sections.len() - 1
    }

    /// Removes and returns the section at `index`, shifting later sections
    /// left.
    pub fn remove(&mut self, index: usize) -> Option<Box<dyn Section>> {
        if index >= self.sections.len() {
            return None;
        }
        let section = self.sections.remove(index);
        self.update();
        Some(section)
    }

    pub fn clear(&mut self) {
        self.sections.clear();
        self.update();
    }

    /// Re-lays the strip out after one or more sections changed width.
    pub fn width_changed(&mut self) {
        self.update();
    }

    /// Forwards a horizontal scroll to all sections. Returns `false` when the
    /// move stayed below the suppression delta and nothing was updated.
    pub fn on_scroll(&mut self, left: f64, width: f64) -> bool {
        if (self.last_left - left).abs() < self.options.min_scroll_delta
            && (self.last_width - width).abs() < self.options.min_scroll_delta
        {
            return false;
        }
        let going_right = left > self.last_left;
        self.last_left = left;
        self.last_width = width;

        #[cfg(feature = "tracing")]
        tracing::trace!(target: "windrow::strip", left, width, going_right, "strip scroll");

        self.apply(left, width, going_right);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sum of section widths including trailing padding per section.
    #[must_use]
    pub fn total_width(&self) -> f64 {
        self.sections
            .iter()
            .map(|s| s.width() + self.options.column_padding)
            .sum()
    }

    /// Height of the tallest section.
    #[must_use]
    pub fn max_height(&self) -> f64 {
        self.sections.iter().map(|s| s.height()).fold(0.0, f64::max)
    }

    fn update(&mut self) {
        self.apply(self.last_left, self.last_width, false);
        let mut offset = 0.0;
        for section in &mut self.sections {
            section.set_offset(offset);
            offset += section.width() + self.options.column_padding;
        }
    }

    fn apply(&mut self, left: f64, width: f64, going_right: bool) {
        let scroll_end = left + width;
        let mut offset = 0.0;
        for section in &mut self.sections {
            let end = offset + section.width();
            if end < left || offset > scroll_end {
                section.hide();
            } else {
                let local_left = (left - offset).max(0.0);
                let local_width = (scroll_end - offset).min(section.width());
                section.show(local_left, local_width, going_right);
            }
            offset = end + self.options.column_padding;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Init,
        Show { left: f64, width: f64, going_right: bool },
        Hide,
        Offset(f64),
    }

    type Log = Rc<RefCell<Vec<(usize, Event)>>>;

    struct TestSection {
        id: usize,
        width: f64,
        height: f64,
        log: Log,
    }

    impl TestSection {
        fn new(id: usize, width: f64, height: f64, log: &Log) -> Self {
            Self {
                id,
                width,
                height,
                log: Rc::clone(log),
            }
        }
    }

    impl Section for TestSection {
        fn width(&self) -> f64 {
            self.width
        }

        fn height(&self) -> f64 {
            self.height
        }

        fn init(&mut self) {
            self.log.borrow_mut().push((self.id, Event::Init));
        }

        fn show(&mut self, left: f64, width: f64, going_right: bool) {
            self.log.borrow_mut().push((
                self.id,
                Event::Show {
                    left,
                    width,
                    going_right,
                },
            ));
        }

        fn hide(&mut self) {
            self.log.borrow_mut().push((self.id, Event::Hide));
        }

        fn set_offset(&mut self, left: f64) {
            self.log.borrow_mut().push((self.id, Event::Offset(left)));
        }
    }

    fn strip_with(log: &Log, widths: &[f64], padding: f64) -> SectionStrip {
        let mut strip = SectionStrip::new(StripOptions {
            column_padding: padding,
            min_scroll_delta: 30.0,
        });
        for (id, &w) in widths.iter().enumerate() {
            strip.push(TestSection::new(id, w, 100.0 + id as f64, log));
        }
        strip
    }

    fn offsets(log: &Log) -> Vec<(usize, f64)> {
        log.borrow()
            .iter()
            .filter_map(|(id, e)| match e {
                Event::Offset(left) => Some((*id, *left)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn sections_are_laid_out_with_padding() {
        let log: Log = Rc::default();
        let _strip = strip_with(&log, &[100.0, 100.0, 100.0], 10.0);
        let latest: Vec<(usize, f64)> = offsets(&log).into_iter().rev().take(3).rev().collect();
        assert_eq!(latest, vec![(0, 0.0), (1, 110.0), (2, 220.0)]);
    }

    #[test]
    fn scroll_shows_visible_slices_in_local_coordinates() {
        let log: Log = Rc::default();
        let mut strip = strip_with(&log, &[100.0, 100.0, 100.0, 100.0], 10.0);
        log.borrow_mut().clear();

        assert!(strip.on_scroll(150.0, 120.0));
        let events: Vec<(usize, Event)> = log
            .borrow()
            .iter()
            .filter(|(_, e)| !matches!(e, Event::Offset(_)))
            .cloned()
            .collect();
        assert_eq!(
            events,
            vec![
                (0, Event::Hide),
                (
                    1,
                    Event::Show {
                        left: 40.0,
                        width: 100.0,
                        going_right: true
                    }
                ),
                (
                    2,
                    Event::Show {
                        left: 0.0,
                        width: 50.0,
                        going_right: true
                    }
                ),
                (3, Event::Hide),
            ]
        );
    }

    #[test]
    fn small_scroll_deltas_are_suppressed() {
        let log: Log = Rc::default();
        let mut strip = strip_with(&log, &[100.0, 100.0], 0.0);
        assert!(strip.on_scroll(150.0, 120.0));
        log.borrow_mut().clear();

        // below the 30px delta on both axes
        assert!(!strip.on_scroll(160.0, 115.0));
        assert!(log.borrow().is_empty());

        // accumulated move crosses the delta relative to the last applied
        // position
        assert!(strip.on_scroll(185.0, 120.0));
        assert!(!log.borrow().is_empty());
    }

    #[test]
    fn scroll_direction_is_reported() {
        let log: Log = Rc::default();
        let mut strip = strip_with(&log, &[400.0], 0.0);
        assert!(strip.on_scroll(100.0, 50.0));
        assert!(strip.on_scroll(20.0, 50.0));
        let directions: Vec<bool> = log
            .borrow()
            .iter()
            .filter_map(|(_, e)| match e {
                Event::Show { going_right, .. } => Some(*going_right),
                _ => None,
            })
            .collect();
        assert!(directions.ends_with(&[true, false]));
    }

    #[test]
    fn remove_and_width_changed_relayout() {
        let log: Log = Rc::default();
        let mut strip = strip_with(&log, &[100.0, 200.0, 50.0], 10.0);
        assert_eq!(strip.total_width(), 380.0);
        assert_eq!(strip.max_height(), 102.0);

        assert!(strip.remove(1).is_some());
        assert_eq!(strip.len(), 2);
        log.borrow_mut().clear();
        strip.width_changed();
        let latest: Vec<(usize, f64)> = offsets(&log);
        assert_eq!(latest, vec![(0, 0.0), (2, 110.0)]);

        assert!(strip.remove(5).is_none());
        strip.clear();
        assert!(strip.is_empty());
        assert_eq!(strip.max_height(), 0.0);
    }

    #[test]
    fn sections_initialize_on_push() {
        let log: Log = Rc::default();
        let _strip = strip_with(&log, &[100.0], 0.0);
        assert_eq!(log.borrow().first(), Some(&(0, Event::Init)));
    }
}

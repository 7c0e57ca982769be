use glam::IVec2;

/// Integer samples along a segment from `origin` to `origin + offset`.
///
/// Sample `k` of `steps` is `origin + offset * k / steps`, rounded to the
/// nearest millimetre. Samples past `steps` continue along the same line,
/// which is how obstacle tails extend behind the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSampler {
    origin: IVec2,
    offset: IVec2,
    steps: u32,
}

impl LineSampler {
    pub fn new(origin: IVec2, offset: IVec2, steps: u32) -> Self {
        Self {
            origin,
            offset,
            steps,
        }
    }

    /// One sample per cell along the major axis of a `cell_delta` cell displacement.
    pub fn through_cells(origin: IVec2, offset: IVec2, cell_delta: IVec2) -> Self {
        let steps = cell_delta.x.unsigned_abs().max(cell_delta.y.unsigned_abs());
        Self::new(origin, offset, steps)
    }

    #[inline]
    pub fn steps(&self) -> u32 {
        self.steps
    }

    #[inline]
    pub fn sample(&self, step: u32) -> IVec2 {
        self.origin
            + IVec2::new(
                lerp_round(self.offset.x, step, self.steps),
                lerp_round(self.offset.y, step, self.steps),
            )
    }

    /// Samples `0..=steps`, then `extra` more past the end.
    pub fn iter(&self, extra: u32) -> LineSamples {
        LineSamples {
            line: *self,
            next: 0,
            end: self.steps.saturating_add(extra),
            done: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LineSamples {
    line: LineSampler,
    next: u32,
    end: u32,
    done: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LineStep {
    pub step: u32,
    pub position: IVec2,
}

impl Iterator for LineSamples {
    type Item = LineStep;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let step = self.next;
        if step == self.end {
            self.done = true;
        } else {
            self.next += 1;
        }
        Some(LineStep {
            step,
            position: self.line.sample(step),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.done {
            0
        } else {
            (self.end - self.next) as usize + 1
        };
        (left, Some(left))
    }
}

impl ExactSizeIterator for LineSamples {}

/// `value * step / steps` rounded half away from zero. With no steps the whole value.
#[inline]
pub fn lerp_round(value: i32, step: u32, steps: u32) -> i32 {
    if steps == 0 {
        return value;
    }
    let num = value as i64 * step as i64;
    let den = steps as i64;
    let half = if num >= 0 { den / 2 } else { -(den / 2) };
    ((num + half) / den) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_hit_both_ends() {
        let line = LineSampler::new(IVec2::new(100, 100), IVec2::new(40, -90), 3);
        let samples: Vec<IVec2> = line.iter(0).map(|s| s.position).collect();
        assert_eq!(
            samples,
            vec![
                IVec2::new(100, 100),
                IVec2::new(113, 70),
                IVec2::new(127, 40),
                IVec2::new(140, 10),
            ]
        );
    }

    #[test]
    fn extra_samples_continue_the_line() {
        let line = LineSampler::new(IVec2::ZERO, IVec2::new(0, 100), 4);
        let iter = line.iter(2);
        assert_eq!(iter.len(), 7);
        let last = iter.last().unwrap();
        assert_eq!(last.step, 6);
        assert_eq!(last.position, IVec2::new(0, 150));
    }

    #[test]
    fn steps_follow_major_axis() {
        let line = LineSampler::through_cells(IVec2::ZERO, IVec2::new(-500, 120), IVec2::new(-10, 3));
        assert_eq!(line.steps(), 10);
        assert_eq!(line.sample(5), IVec2::new(-250, 60));
    }

    #[test]
    fn zero_steps_yield_the_target() {
        let line = LineSampler::new(IVec2::new(5, 5), IVec2::new(10, 0), 0);
        let samples: Vec<LineStep> = line.iter(0).collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].position, IVec2::new(15, 5));
    }

    #[test]
    fn lerp_rounds_symmetrically() {
        assert_eq!(lerp_round(10, 1, 4), 3);
        assert_eq!(lerp_round(-10, 1, 4), -3);
        assert_eq!(lerp_round(7, 7, 7), 7);
        assert_eq!(lerp_round(5, 3, 0), 5);
    }
}

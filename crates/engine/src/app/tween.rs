pub trait Lerp: Copy {
    fn lerp(self, target: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, target: f32, t: f32) -> f32 {
        self + (target - self) * t
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    ExponentialInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::ExponentialInOut => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let scaled = t * 2.0;
                if scaled < 1.0 {
                    0.5 * 2f32.powf(10.0 * (scaled - 1.0))
                } else {
                    0.5 * (2.0 - 2f32.powf(-10.0 * (scaled - 1.0)))
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenStep<V> {
    Idle,
    Running(V),
    Completed(V),
}

#[derive(Debug, Clone, Copy)]
struct Segment<V> {
    from: V,
    target: V,
    duration_ms: f32,
    elapsed_ms: f32,
}

/// An animatable value advanced by explicit `update` calls.
///
/// `Running` steps stand in for per-update callbacks and the single
/// `Completed` step for the completion callback.
#[derive(Debug, Clone, Copy)]
pub struct Tween<V: Lerp> {
    value: V,
    easing: Easing,
    segment: Option<Segment<V>>,
}

impl<V: Lerp> Tween<V> {
    pub fn new(initial: V) -> Self {
        Self {
            value: initial,
            easing: Easing::Linear,
            segment: None,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Starts animating from the current value; replaces any running segment.
    pub fn to(&mut self, target: V, duration_ms: f32) {
        self.segment = Some(Segment {
            from: self.value,
            target,
            duration_ms: duration_ms.max(0.0),
            elapsed_ms: 0.0,
        });
    }

    pub fn update(&mut self, delta_ms: f32) -> TweenStep<V> {
        let Some(segment) = self.segment.as_mut() else {
            return TweenStep::Idle;
        };

        segment.elapsed_ms += delta_ms.max(0.0);
        if segment.duration_ms <= 0.0 || segment.elapsed_ms >= segment.duration_ms {
            self.value = segment.target;
            self.segment = None;
            return TweenStep::Completed(self.value);
        }

        let progress = self
            .easing
            .apply(segment.elapsed_ms / segment.duration_ms);
        self.value = segment.from.lerp(segment.target, progress);
        TweenStep::Running(self.value)
    }

    pub fn value(&self) -> V {
        self.value
    }

    pub fn is_running(&self) -> bool {
        self.segment.is_some()
    }

    /// Halts at the current value without reporting completion.
    pub fn stop(&mut self) {
        self.segment = None;
    }

    pub fn set(&mut self, value: V) {
        self.segment = None;
        self.value = value;
    }
}

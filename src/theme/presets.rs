/// One keyframe step: selector and its declarations.
pub type PresetStep = (&'static str, &'static [(&'static str, &'static str)]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationPreset {
    /// Token name used in the theme document.
    pub name: &'static str,
    /// Name of the emitted `@keyframes` block.
    pub keyframes_name: &'static str,
    pub steps: &'static [PresetStep],
}

pub const PRESETS: &[AnimationPreset] = &[
    AnimationPreset {
        name: "fadeIn",
        keyframes_name: "fade-in",
        steps: &[("from", &[("opacity", "0")]), ("to", &[("opacity", "1")])],
    },
    AnimationPreset {
        name: "fadeOut",
        keyframes_name: "fade-out",
        steps: &[("from", &[("opacity", "1")]), ("to", &[("opacity", "0")])],
    },
    AnimationPreset {
        name: "slideUp",
        keyframes_name: "slide-up",
        steps: &[
            ("from", &[("opacity", "0"), ("transform", "translateY(16px)")]),
            ("to", &[("opacity", "1"), ("transform", "translateY(0)")]),
        ],
    },
    AnimationPreset {
        name: "slideDown",
        keyframes_name: "slide-down",
        steps: &[
            ("from", &[("opacity", "0"), ("transform", "translateY(-16px)")]),
            ("to", &[("opacity", "1"), ("transform", "translateY(0)")]),
        ],
    },
    AnimationPreset {
        name: "scaleIn",
        keyframes_name: "scale-in",
        steps: &[
            ("from", &[("opacity", "0"), ("transform", "scale(0.95)")]),
            ("to", &[("opacity", "1"), ("transform", "scale(1)")]),
        ],
    },
    AnimationPreset {
        name: "spin",
        keyframes_name: "spin",
        steps: &[
            ("from", &[("transform", "rotate(0deg)")]),
            ("to", &[("transform", "rotate(360deg)")]),
        ],
    },
    AnimationPreset {
        name: "pulse",
        keyframes_name: "pulse",
        steps: &[
            ("0%", &[("opacity", "1")]),
            ("50%", &[("opacity", "0.5")]),
            ("100%", &[("opacity", "1")]),
        ],
    },
    AnimationPreset {
        name: "bounce",
        keyframes_name: "bounce",
        steps: &[
            ("0%", &[("transform", "translateY(0)")]),
            ("50%", &[("transform", "translateY(-25%)")]),
            ("100%", &[("transform", "translateY(0)")]),
        ],
    },
];

/// Preset enabled by `animations.<name>: true`.
pub fn preset(name: &str) -> Option<&'static AnimationPreset> {
    PRESETS.iter().find(|preset| preset.name == name)
}

pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|preset| preset.name)
}

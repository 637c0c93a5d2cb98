//! The marketing page: static sections around the live demo slot.

use crate::params::Param;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Hero,
    Features,
    Demo,
    Technology,
    About,
    Footer,
}

pub struct PageComposition {
    sections: Vec<Section>,
}

const PIPELINE: &[(&str, &str)] = &[
    ("Gesture Capture", "The webcam captures hand and body movement as real-time video frames."),
    ("Computer Vision Processing", "Video frames are analyzed to detect and track hand landmarks."),
    ("Gesture Classification", "A trained model classifies detected gestures into control categories."),
    ("Parameter Mapping", "Classified gestures map onto volume, bass, tempo and pitch."),
    ("Audio Manipulation", "The audio engine applies parameter changes to the stream in real time."),
];

fn feature_blurb(param: Param) -> &'static str {
    match param {
        Param::Volume => "Control volume levels with intuitive hand movements",
        Param::Bass => "Adjust bass frequencies with dynamic gestures",
        Param::Tempo => "Change tempo in real-time with rhythmic movements",
        Param::Pitch => "Manipulate pitch with precise hand positioning",
    }
}

impl PageComposition {
    pub fn standard() -> Self {
        Self {
            sections: vec![
                Section::Hero,
                Section::Features,
                Section::Demo,
                Section::Technology,
                Section::About,
                Section::Footer,
            ],
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Plain-text rendering; `demo` fills the interactive slot.
    pub fn render(&self, demo: &str) -> String {
        self.sections
            .iter()
            .map(|section| render_section(*section, demo))
            .collect()
    }
}

fn render_section(section: Section, demo: &str) -> String {
    match section {
        Section::Hero => "AEROMIX\nShape Sound With Your Movements\n\
             Real-time gesture-based audio control, bridging movement and sound.\n\n"
            .to_string(),
        Section::Features => {
            let mut out = String::from("FEATURES\n");
            for param in Param::ALL {
                out.push_str(&format!("  {} Control - {}\n", param.name(), feature_blurb(param)));
            }
            out.push('\n');
            out
        }
        Section::Demo => format!("INTERACTIVE DEMO\n{}\n\n", demo.trim_end()),
        Section::Technology => {
            let mut out = String::from("HOW IT WORKS\n");
            for (i, (title, text)) in PIPELINE.iter().enumerate() {
                out.push_str(&format!("  {}. {}: {}\n", i + 1, title, text));
            }
            out.push('\n');
            out
        }
        Section::About => "ABOUT\nAeroMix grew out of a wish for more intuitive ways to play with sound.\n\
             It is open source and welcomes contributions.\n\n"
            .to_string(),
        Section::Footer => "(c) AeroMix\n".to_string(),
    }
}

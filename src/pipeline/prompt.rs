//! Prompt composition from the small coded choices clients send

/// Appended to text prompts when titles are enabled
pub const TITLE_INSTRUCTION: &str =
    " Include an appropriate title in bold for the content generated in the final response.";

/// Narrative form selected by `content_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Story,
    Poem,
    Song,
    Play,
}

impl ContentKind {
    /// "1" story, "2" poem, "3" play; anything else is a song
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Self::Story,
            "2" => Self::Poem,
            "3" => Self::Play,
            _ => Self::Song,
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Poem => "poem that rhymes",
            Self::Song => "song that rhymes",
            Self::Play => {
                "play (formatted with characters, stage direction, scenes act, etc. do not format as a poem)"
            }
        }
    }
}

/// Art style selected by `style`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtStyle {
    Photograph,
    OilPainting,
    AcrylicPainting,
    Watercolor,
    Sketch,
}

impl ArtStyle {
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Self::Photograph,
            "2" => Self::OilPainting,
            "3" => Self::AcrylicPainting,
            "4" => Self::Watercolor,
            _ => Self::Sketch,
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Photograph => "real life photography",
            Self::OilPainting => "an oil painting",
            Self::AcrylicPainting => "an acrylic painting",
            Self::Watercolor => "a watercolor",
            Self::Sketch => "sketch",
        }
    }
}

/// Aspect ratio selected by `orientation`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Square,
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Self::Square,
            "2" => Self::Portrait,
            _ => Self::Landscape,
        }
    }

    pub fn aspect_ratio(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Landscape => "4:3",
        }
    }
}

/// Builds the instruction strings sent to the models. User text is inserted
/// verbatim.
#[derive(Debug, Clone, Copy)]
pub struct PromptComposer {
    include_title: bool,
}

impl PromptComposer {
    pub fn new(include_title: bool) -> Self {
        Self { include_title }
    }

    pub fn text_prompt(&self, kind: ContentKind, prompt: &str) -> String {
        self.compose(kind, "", prompt)
    }

    pub fn image_text_prompt(&self, kind: ContentKind, prompt: &str) -> String {
        self.compose(kind, "about this image ", prompt)
    }

    pub fn image_prompt(&self, style: ArtStyle, prompt: &str) -> String {
        format!("{} of {}", style.phrase(), prompt)
    }

    fn compose(&self, kind: ContentKind, about: &str, prompt: &str) -> String {
        let mut composed = format!(
            "Write a {} {}with the following prompt: {}.",
            kind.phrase(),
            about,
            prompt
        );
        if self.include_title {
            composed.push_str(TITLE_INSTRUCTION);
        }
        composed
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(true)
    }
}

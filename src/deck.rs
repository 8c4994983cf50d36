use std::path::{Path, PathBuf};

/// One image entry in the deck
///
/// Identity is positional: a slide is created on insert and destroyed on
/// remove or clear, there is no stable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    /// Path to the source image
    pub image_path: PathBuf,
}

impl Slide {
    pub fn new<P: Into<PathBuf>>(image_path: P) -> Self {
        Self { image_path: image_path.into() }
    }

    /// File name shown by the boundary layer
    pub fn display_name(&self) -> String {
        self.image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.image_path.display().to_string())
    }
}

/// Ordered slide collection with a single selection
///
/// Deck order defines preview, playback and encode order. The selection is
/// `None` when the deck is empty or nothing is selected, and always stays
/// within `[0, len - 1]` otherwise.
#[derive(Debug, Clone, Default)]
pub struct SlideDeck {
    slides: Vec<Slide>,
    selection: Option<usize>,
}

impl SlideDeck {
    /// Create a new empty deck
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a slide after the current selection and select it.
    ///
    /// With no selection the slide lands at index 0. The deck accepts any
    /// path; decode validity is the caller's concern.
    pub fn insert_after_selection<P: Into<PathBuf>>(&mut self, image_path: P) -> usize {
        let index = self.selection.map(|i| i + 1).unwrap_or(0);
        self.slides.insert(index, Slide::new(image_path));
        self.selection = Some(index);
        index
    }

    /// Remove the selected slide.
    ///
    /// The new selection is `None` for an emptied deck, otherwise the old
    /// index clamped back into range. No-op without a selection.
    pub fn remove_selected(&mut self) -> Option<Slide> {
        let index = self.selection?;
        let removed = self.slides.remove(index);

        self.selection = if self.slides.is_empty() {
            None
        } else {
            Some(index.min(self.slides.len() - 1))
        };

        Some(removed)
    }

    /// Swap the selected slide with its predecessor; selection follows it.
    /// No-op at index 0 or without a selection.
    pub fn move_selected_up(&mut self) -> bool {
        match self.selection {
            Some(index) if index > 0 => {
                self.slides.swap(index, index - 1);
                self.selection = Some(index - 1);
                true
            }
            _ => false,
        }
    }

    /// Swap the selected slide with its successor; selection follows it.
    /// No-op at the last index or without a selection.
    pub fn move_selected_down(&mut self) -> bool {
        match self.selection {
            Some(index) if index + 1 < self.slides.len() => {
                self.slides.swap(index, index + 1);
                self.selection = Some(index + 1);
                true
            }
            _ => false,
        }
    }

    /// Empty the deck and reset the selection.
    ///
    /// Asking the user for confirmation is the boundary layer's concern.
    pub fn clear(&mut self) {
        self.slides.clear();
        self.selection = None;
    }

    /// Select the slide at `index`, or pass `None` to deselect
    pub fn select(&mut self, index: Option<usize>) {
        self.selection = match index {
            Some(i) if i < self.slides.len() => Some(i),
            _ => None,
        };
    }

    /// Currently selected index, if any
    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Currently selected slide, if any
    pub fn selected_slide(&self) -> Option<&Slide> {
        self.selection.and_then(|i| self.slides.get(i))
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slide> {
        self.slides.iter()
    }

    /// Image paths in deck order, the immutable snapshot a render job takes
    pub fn image_paths(&self) -> Vec<PathBuf> {
        self.slides.iter().map(|slide| slide.image_path.clone()).collect()
    }
}

/// Extensions the boundary layer accepts when adding images
pub fn is_supported_image(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.to_ascii_lowercase()).as_deref(),
        Some("jpg") | Some("jpeg") | Some("png")
    )
}

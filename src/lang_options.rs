/// Shader language options affecting preprocessing
#[derive(Clone, Debug)]
pub struct LangOptions {
    /// Value of `__VERSION__` until a `#version` directive says otherwise
    pub shader_version: u32,
    /// Predefine `GL_FRAGMENT_PRECISION_HIGH`
    pub fragment_precision_high: bool,
    /// Supported extensions; each one is predefined as a macro with value 1
    pub extensions: Vec<String>,
}

impl LangOptions {
    pub fn es3() -> Self {
        LangOptions {
            shader_version: 300,
            fragment_precision_high: true,
            ..Default::default()
        }
    }

    pub fn supports_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e == name)
    }
}

impl Default for LangOptions {
    fn default() -> Self {
        LangOptions {
            shader_version: 100,
            fragment_precision_high: false,
            extensions: Vec::new(),
        }
    }
}

//! Display languages and the translation lookup chain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Pt,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Self::En, Self::Pt];

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Pt => "pt",
        }
    }

    /// Name of the language in that language.
    pub fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Pt => "Português",
        }
    }

    /// The locale after this one, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::En => Self::Pt,
            Self::Pt => Self::En,
        }
    }

    /// Maps a POSIX or BCP 47 tag such as `pt_BR.UTF-8` or `pt-BR` onto a
    /// supported locale.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lang = tag
            .split(['_', '-', '.', '@'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        lang.parse().ok()
    }

    /// Picks the locale from `LC_ALL`, `LC_MESSAGES` or `LANG`, defaulting to
    /// English for unset or unsupported values.
    pub fn detect() -> Self {
        Self::detect_from(|key| std::env::var(key).ok())
    }

    pub fn detect_from<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .into_iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.is_empty())
            .and_then(|value| Self::from_tag(&value))
            .unwrap_or_default()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("translation not available for {0}")]
pub struct UnsupportedLocale(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "pt" => Ok(Self::Pt),
            other => Err(UnsupportedLocale(other.to_string())),
        }
    }
}

/// Source of localized strings.
pub trait TranslationProvider: Send {
    fn lookup(&self, locale: Locale, key: &str) -> Option<&str>;
}

/// The string tables shipped with the application.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTranslations;

impl TranslationProvider for BuiltinTranslations {
    fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        let table = match locale {
            Locale::En => EN,
            Locale::Pt => PT,
        };
        table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

/// Resolves keys for the active locale, falling back to English and then to
/// a `[key]` placeholder.
pub struct Translator {
    provider: Box<dyn TranslationProvider>,
    locale: Locale,
}

impl Translator {
    pub fn new(locale: Locale) -> Self {
        Self::with_provider(Box::new(BuiltinTranslations), locale)
    }

    pub fn with_provider(provider: Box<dyn TranslationProvider>, locale: Locale) -> Self {
        Self { provider, locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    pub fn get(&self, key: &str) -> String {
        if let Some(value) = self.provider.lookup(self.locale, key) {
            return value.to_string();
        }
        if let Some(value) = self.provider.lookup(Locale::default(), key) {
            warn!(key, locale = %self.locale, "translation missing, using default locale");
            return value.to_string();
        }
        warn!(key, "translation missing in every locale");
        format!("[{key}]")
    }

    /// Looks up every key in order.
    pub fn get_all(&self, keys: &[&str]) -> Vec<String> {
        keys.iter().map(|key| self.get(key)).collect()
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

type Table = &'static [(&'static str, &'static str)];

const EN: Table = &[
    ("appTitle", "PomoChill"),
    ("slogan", "Focus, breathe, achieve."),
    ("work", "Focus"),
    ("shortBreak", "Short Break"),
    ("longBreak", "Long Break"),
    ("start", "Start"),
    ("pause", "Pause"),
    ("resume", "Resume"),
    ("reset", "Reset"),
    ("skip", "Skip"),
    ("settings", "Settings"),
    ("save", "Save"),
    ("stats", "Statistics"),
    ("sound", "Sound"),
    ("music", "Focus music"),
    ("notifications", "Notifications"),
    ("language", "Language"),
    ("quit", "Quit"),
    ("minutes", "min"),
    ("cyclesCompleted", "Cycles completed"),
    ("focusTime", "Focus time"),
    ("breaksTaken", "Breaks taken"),
    ("breakSuggestionsTitle", "Break ideas"),
    ("readyToStart", "Ready to start? Click Start!"),
    ("clickStartWhenReady", "Click Start when you're ready!"),
    ("pausedMessage", "Paused. Ready to resume?"),
    ("settingsSaved", "Settings saved successfully!"),
    ("languageChanged", "Language changed to English!"),
    ("confirmQuit", "You have an active session. Press quit again to leave."),
    ("workStartMessage1", "Let's focus! You can do it."),
    ("workStartMessage2", "Time to concentrate. Take a deep breath."),
    ("workStartMessage3", "Full focus for the next few minutes!"),
    ("breakStartMessage1", "Time for a well-deserved break!"),
    ("breakStartMessage2", "Relax and recharge."),
    ("breakStartMessage3", "Breathe, stretch, and rest."),
    ("workCompleteMessage1", "Great job! Time for a break."),
    ("workCompleteMessage2", "Focus session completed successfully!"),
    ("workCompleteMessage3", "You're doing really well!"),
    ("breakCompleteMessage1", "Energy renewed! Let's continue."),
    ("breakCompleteMessage2", "Break completed. Ready to focus?"),
    ("breakCompleteMessage3", "Rested mind, renewed focus!"),
    ("takeABreath", "Take a deep breath for 30 seconds"),
    ("stretchYourBody", "Stretch your arms and neck"),
    ("drinkWater", "Hydrate with a glass of water"),
    ("walkAround", "Walk around a bit"),
    ("listenToMusic", "Listen to your favorite music"),
    ("meditate", "Meditate for a few minutes"),
    ("readSomething", "Read a few pages of a book"),
    ("checkYourMessages", "Check your messages or emails"),
    ("errorNotNumber", "Duration, Short break and Long break values must be numbers"),
    ("errorWorkRange", "Focus duration must be between 1 and 60 minutes"),
    ("errorShortBreakRange", "Short break must be between 1 and 30 minutes"),
    ("errorLongBreakRange", "Long break must be between 1 and 60 minutes"),
    ("workCompleteTitle", "Focus session complete!"),
    ("breakCompleteTitle", "Break over!"),
];

const PT: Table = &[
    ("appTitle", "PomoChill"),
    ("slogan", "Foque, respire, conquiste."),
    ("work", "Foco"),
    ("shortBreak", "Pausa Curta"),
    ("longBreak", "Pausa Longa"),
    ("start", "Iniciar"),
    ("pause", "Pausar"),
    ("resume", "Continuar"),
    ("reset", "Reiniciar"),
    ("skip", "Pular"),
    ("settings", "Configurações"),
    ("save", "Salvar"),
    ("stats", "Estatísticas"),
    ("sound", "Som"),
    ("music", "Música de foco"),
    ("notifications", "Notificações"),
    ("language", "Idioma"),
    ("quit", "Sair"),
    ("minutes", "min"),
    ("cyclesCompleted", "Ciclos completos"),
    ("focusTime", "Tempo de foco"),
    ("breaksTaken", "Pausas feitas"),
    ("breakSuggestionsTitle", "Ideias para a pausa"),
    ("readyToStart", "Pronto para começar? Clique em Iniciar!"),
    ("clickStartWhenReady", "Clique em Iniciar quando estiver pronto!"),
    ("pausedMessage", "Pausado. Pronto para continuar?"),
    ("settingsSaved", "Configurações salvas com sucesso!"),
    ("languageChanged", "Idioma alterado para Português!"),
    ("confirmQuit", "Você tem uma sessão ativa. Pressione sair novamente para fechar."),
    ("workStartMessage1", "Vamos focar! Você consegue."),
    ("workStartMessage2", "Hora de concentrar. Respire fundo."),
    ("workStartMessage3", "Foco total pelos próximos minutos!"),
    ("breakStartMessage1", "Hora de uma pausa merecida!"),
    ("breakStartMessage2", "Relaxe e recarregue."),
    ("breakStartMessage3", "Respire, alongue-se e descanse."),
    ("workCompleteMessage1", "Ótimo trabalho! Hora da pausa."),
    ("workCompleteMessage2", "Sessão de foco concluída com sucesso!"),
    ("workCompleteMessage3", "Você está indo muito bem!"),
    ("breakCompleteMessage1", "Energia renovada! Vamos continuar."),
    ("breakCompleteMessage2", "Pausa concluída. Pronto para focar?"),
    ("breakCompleteMessage3", "Mente descansada, foco renovado!"),
    ("takeABreath", "Respire fundo por 30 segundos"),
    ("stretchYourBody", "Alongue os braços e o pescoço"),
    ("drinkWater", "Hidrate-se com um copo de água"),
    ("walkAround", "Caminhe um pouco"),
    ("listenToMusic", "Ouça sua música favorita"),
    ("meditate", "Medite por alguns minutos"),
    ("readSomething", "Leia algumas páginas de um livro"),
    ("checkYourMessages", "Confira suas mensagens ou e-mails"),
    ("errorNotNumber", "Os valores de foco, pausa curta e pausa longa devem ser números"),
    ("errorWorkRange", "O foco deve durar entre 1 e 60 minutos"),
    ("errorShortBreakRange", "A pausa curta deve durar entre 1 e 30 minutos"),
    ("errorLongBreakRange", "A pausa longa deve durar entre 1 e 60 minutos"),
    ("workCompleteTitle", "Sessão de foco concluída!"),
    ("breakCompleteTitle", "Fim da pausa!"),
];

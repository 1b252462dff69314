//! Supported languages, greetings, and system instructions
//!
//! The agent serves the MENA region with a closed set of locale codes.
//! Unknown codes fall back to English rather than failing the call.

use serde::{Deserialize, Serialize};

/// Supported call languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "ar-SA")]
    ArSa,
}

impl Language {
    /// Locale code as sent by the telephony vendor
    pub fn code(&self) -> &'static str {
        match self {
            Language::EnUs => "en-US",
            Language::ArSa => "ar-SA",
        }
    }

    /// Parse a vendor locale code. Returns `None` for unsupported codes.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "en-US" => Some(Language::EnUs),
            "ar-SA" => Some(Language::ArSa),
            _ => None,
        }
    }

    /// Parse with fallback to the default language
    pub fn parse_or_default(code: &str) -> Self {
        Self::parse(code).unwrap_or_default()
    }

    /// All supported languages
    pub fn all() -> &'static [Language] {
        &[Language::EnUs, Language::ArSa]
    }

    /// Greeting spoken on `call.started`
    pub fn greeting(&self) -> &'static str {
        match self {
            Language::EnUs => "Welcome to Zoid AI Support. How can I help you today?",
            Language::ArSa => "مرحبا بك في دعم Zoid الذكي. كيف يمكنني مساعدتك؟",
        }
    }

    /// Apology spoken when a turn fails internally. The voice channel must
    /// always receive a playable utterance, so every error path ends here.
    pub fn apology(&self) -> &'static str {
        match self {
            Language::EnUs => {
                "I'm sorry, I couldn't process that. Could you please try again?"
            },
            Language::ArSa => "عذراً، لم أتمكن من معالجة طلبك. هل يمكنك المحاولة مرة أخرى؟",
        }
    }

    /// Spoken while the call is being handed to a human agent
    pub fn transfer_message(&self) -> &'static str {
        match self {
            Language::EnUs => {
                "I'm connecting you with one of our support specialists now. Please hold."
            },
            Language::ArSa => "سأقوم بتحويلك إلى أحد مختصي الدعم الآن. يرجى الانتظار.",
        }
    }

    /// Spoken when escalation is warranted but no human agent is free
    pub fn agents_busy_message(&self) -> &'static str {
        match self {
            Language::EnUs => {
                "All of our support specialists are busy at the moment. \
                 Please stay on the line or call back later."
            },
            Language::ArSa => {
                "جميع مختصي الدعم مشغولون حالياً. يرجى البقاء على الخط أو المعاودة لاحقاً."
            },
        }
    }

    /// Base system instruction for response generation.
    ///
    /// The retrieved context and the structured-output contract are appended
    /// by the generator; this covers identity, tone, and the
    /// knowledge-base-only rule.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            Language::EnUs => SYSTEM_INSTRUCTION_EN,
            Language::ArSa => SYSTEM_INSTRUCTION_AR,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

const SYSTEM_INSTRUCTION_EN: &str = "\
You are Zoid, a customer service voice assistant for the MENA region. Help \
customers by answering questions and resolving issues based only on the \
provided knowledge base context.

Voice and persona:
- Be friendly, patient, and knowledgeable without being condescending.
- Use natural, conversational speech with contractions.
- Show genuine concern for customer issues and humility when you don't know \
something.

Critical rule, knowledge base only:
- If the context doesn't have the answer, say: \"I don't have information \
about that in our knowledge base. Let me connect you with someone who can \
help.\"
- Never make up information or assume facts not in the context.
- Never mention the knowledge base, the context, or your technical \
limitations to the customer.

Conversation guidelines:
- Keep responses under 30 words when possible; this is a phone call.
- Be direct and clear; use step-by-step instructions when needed.
- Acknowledge frustration (\"I understand that's frustrating\") and focus on \
solutions.
- Close naturally: \"Is there anything else I can help with?\"";

const SYSTEM_INSTRUCTION_AR: &str = "\
أنت Zoid، وكيل خدمة عملاء صوتي للمنطقة العربية. ساعد العملاء بالإجابة على \
الأسئلة وحل المشاكل بناءً فقط على سياق قاعدة المعرفة المقدمة.

الصوت والشخصية:
- كن ودياً وصبوراً وملماً.
- استخدم اللغة المحكية الطبيعية.
- أظهر اهتماماً حقيقياً بمشاكل العملاء وتواضعاً عندما لا تعرف شيئاً.

القاعدة الحرجة — قاعدة المعرفة فقط:
- إذا لم يكن الجواب في السياق، قل: \"ليس لدي معلومات عن هذا. دعني أصلك بشخص \
يمكنه مساعدتك.\"
- لا تخترع معلومات ولا تفترض حقائق خارج السياق.
- لا تذكر قاعدة المعرفة أو القيود التقنية للعميل.

إرشادات المحادثة:
- اجعل الردود قصيرة؛ هذه مكالمة هاتفية.
- كن واضحاً ومباشراً واستخدم خطوات عند الحاجة.
- اعترف بالإحباط وركز على الحلول.
- أنهِ بشكل طبيعي: \"هل هناك أي شيء آخر يمكنني مساعدتك فيه؟\"";

//! Per-language prompt packs.
//!
//! Each supported language carries natively-phrased system and user
//! templates rather than machine-translated copies of the English ones.
//! Adding a language is a data change: append a pack to `PACKS`. Unknown
//! codes resolve to the English pack.

use lorehawk_schema::LanguageCode;

/// All templates and fixed strings for one language.
pub struct LanguagePack {
    pub code: &'static str,
    /// Knowledge analysis: system role and the submission template
    /// (`{subject}`, `{input}`).
    pub analysis_system: &'static str,
    pub analysis_user: &'static str,
    /// Topic enrichment (`{subject}`, `{topic}`, `{description}`).
    pub topic_system: &'static str,
    pub topic_user: &'static str,
    /// Timeline synthesis (`{subject}`).
    pub timeline_system: &'static str,
    pub timeline_user: &'static str,
    /// Feedback narrative (`{subject}`, `{score}`, `{covered}`, `{missing}`,
    /// `{input}`, `{assessment}`).
    pub feedback_system: &'static str,
    pub feedback_user: &'static str,
    /// Forced re-translation of a response that ignored the language
    /// instruction (`{text}`).
    pub retranslate_user: &'static str,
    /// Placeholders used when a single topic enrichment fails.
    pub placeholder_overview: &'static str,
    pub placeholder_key_point: &'static str,
}

/// Resolve the pack for a language, falling back to English.
pub fn pack_for(language: &LanguageCode) -> &'static LanguagePack {
    PACKS
        .iter()
        .find(|p| p.code == language.as_str())
        .unwrap_or(&PACKS[0])
}

/// Fill `{key}` placeholders in a template.
pub(crate) fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

const ANALYSIS_SHAPE: &str = r#"{"score": <0-100>, "covered_topics": [{"name": "...", "description": "..."}], "missing_topics": [{"name": "...", "description": "..."}], "topic_coverage": [{"name": "...", "percentage": <0-100>}], "feedback": "..."}"#;

pub static PACKS: &[LanguagePack] = &[
    LanguagePack {
        code: "en",
        analysis_system: "You are a rigorous knowledge assessor. Judge how well a free-form answer covers a subject. Respond with exactly one JSON object of this shape: {shape}. Coverage percentages must be realistic and varied; never report every topic at 100. Write every name, description and the feedback in English.",
        analysis_user: "Subject: {subject}\n\nThe student wrote:\n{input}\n\nAssess the answer: raw score, the subject topics it covers, the important topics it misses, per-topic coverage percentages, and two or three sentences of feedback.",
        topic_system: "You are a concise subject-matter tutor. Respond with exactly one JSON object: {\"overview\": \"2-3 sentences\", \"key_points\": [\"3 to 5 short points\"]}. Write in English.",
        topic_user: "Subject: {subject}\nTopic: {topic}\nContext: {description}\n\nGive a short overview of this topic and its key points.",
        timeline_system: "You are a historian of ideas. Respond with exactly one JSON array of exactly 6 objects, each {\"year\": \"...\", \"title\": \"...\", \"description\": \"...\"}, in chronological order. Write in English.",
        timeline_user: "Build a 6-event historical timeline of {subject}, from its origins to the present day.",
        feedback_system: "You are a warm, inspirational mentor. Write a short narrative in plain English prose: no markdown emphasis, no numbered lists, no bullet points. Encourage the student to keep learning.",
        feedback_user: "Subject: {subject}\nScore: {score}/100\nTopics covered: {covered}\nTopics to explore next: {missing}\nAssessment notes: {assessment}\n\nThe student wrote:\n{input}\n\nWrite an encouraging summary of where they stand and where to go next.",
        retranslate_user: "Faithfully translate the following text into English. Return only the translation:\n\n{text}",
        placeholder_overview: "Overview unavailable",
        placeholder_key_point: "Explanation could not be generated",
    },
    LanguagePack {
        code: "es",
        analysis_system: "Eres un evaluador riguroso de conocimientos. Juzga la respuesta libre de un estudiante sobre un tema. Responde con exactamente un objeto JSON con esta forma: {shape}. Los porcentajes de cobertura deben ser realistas y variados; nunca informes todos los temas al 100. Escribe cada nombre, descripción y la retroalimentación en español.",
        analysis_user: "Tema: {subject}\n\nEl estudiante escribió:\n{input}\n\nEvalúa la respuesta: puntuación bruta, los temas que cubre, los temas importantes que faltan, porcentajes de cobertura por tema y dos o tres frases de retroalimentación.",
        topic_system: "Eres un tutor conciso experto en la materia. Responde con exactamente un objeto JSON: {\"overview\": \"2-3 frases\", \"key_points\": [\"de 3 a 5 puntos breves\"]}. Escribe en español.",
        topic_user: "Tema: {subject}\nSubtema: {topic}\nContexto: {description}\n\nDa un resumen breve de este subtema y sus puntos clave.",
        timeline_system: "Eres un historiador de las ideas. Responde con exactamente un arreglo JSON de exactamente 6 objetos, cada uno {\"year\": \"...\", \"title\": \"...\", \"description\": \"...\"}, en orden cronológico. Escribe en español.",
        timeline_user: "Construye una cronología histórica de 6 eventos sobre {subject}, desde sus orígenes hasta el presente.",
        feedback_system: "Eres un mentor inspirador y cercano. Escribe una narración breve en prosa sencilla en español: sin énfasis de markdown, sin listas numeradas, sin viñetas. Anima al estudiante a seguir aprendiendo.",
        feedback_user: "Tema: {subject}\nPuntuación: {score}/100\nTemas cubiertos: {covered}\nTemas por explorar: {missing}\nNotas de la evaluación: {assessment}\n\nEl estudiante escribió:\n{input}\n\nEscribe un resumen alentador de dónde está y hacia dónde seguir.",
        retranslate_user: "Traduce fielmente el siguiente texto al español. Devuelve solo la traducción:\n\n{text}",
        placeholder_overview: "Resumen no disponible",
        placeholder_key_point: "No se pudo generar la explicación",
    },
    LanguagePack {
        code: "fr",
        analysis_system: "Tu es un évaluateur rigoureux des connaissances. Juge la réponse libre d'un étudiant sur un sujet. Réponds avec exactement un objet JSON de cette forme : {shape}. Les pourcentages de couverture doivent être réalistes et variés ; ne déclare jamais tous les sujets à 100. Écris chaque nom, description et le retour en français.",
        analysis_user: "Sujet : {subject}\n\nL'étudiant a écrit :\n{input}\n\nÉvalue la réponse : score brut, les notions couvertes, les notions importantes manquantes, les pourcentages de couverture par notion, et deux ou trois phrases de retour.",
        topic_system: "Tu es un tuteur concis et expert. Réponds avec exactement un objet JSON : {\"overview\": \"2-3 phrases\", \"key_points\": [\"3 à 5 points courts\"]}. Écris en français.",
        topic_user: "Sujet : {subject}\nNotion : {topic}\nContexte : {description}\n\nDonne un bref aperçu de cette notion et ses points clés.",
        timeline_system: "Tu es un historien des idées. Réponds avec exactement un tableau JSON d'exactement 6 objets, chacun {\"year\": \"...\", \"title\": \"...\", \"description\": \"...\"}, en ordre chronologique. Écris en français.",
        timeline_user: "Construis une chronologie historique de 6 événements sur {subject}, des origines à nos jours.",
        feedback_system: "Tu es un mentor chaleureux et inspirant. Écris un court récit en prose simple en français : pas d'emphase markdown, pas de listes numérotées, pas de puces. Encourage l'étudiant à continuer d'apprendre.",
        feedback_user: "Sujet : {subject}\nScore : {score}/100\nNotions couvertes : {covered}\nNotions à explorer : {missing}\nNotes d'évaluation : {assessment}\n\nL'étudiant a écrit :\n{input}\n\nÉcris un résumé encourageant de sa situation et de la suite.",
        retranslate_user: "Traduis fidèlement le texte suivant en français. Renvoie uniquement la traduction :\n\n{text}",
        placeholder_overview: "Aperçu indisponible",
        placeholder_key_point: "L'explication n'a pas pu être générée",
    },
    LanguagePack {
        code: "de",
        analysis_system: "Du bist ein strenger Wissensprüfer. Beurteile die freie Antwort eines Lernenden zu einem Thema. Antworte mit genau einem JSON-Objekt dieser Form: {shape}. Die Abdeckungsprozente müssen realistisch und unterschiedlich sein; melde niemals alle Themen mit 100. Schreibe jeden Namen, jede Beschreibung und das Feedback auf Deutsch.",
        analysis_user: "Thema: {subject}\n\nDer Lernende schrieb:\n{input}\n\nBewerte die Antwort: Rohpunktzahl, abgedeckte Teilthemen, fehlende wichtige Teilthemen, Abdeckungsprozente je Teilthema und zwei bis drei Sätze Feedback.",
        topic_system: "Du bist ein knapper Fachtutor. Antworte mit genau einem JSON-Objekt: {\"overview\": \"2-3 Sätze\", \"key_points\": [\"3 bis 5 kurze Punkte\"]}. Schreibe auf Deutsch.",
        topic_user: "Thema: {subject}\nTeilthema: {topic}\nKontext: {description}\n\nGib einen kurzen Überblick über dieses Teilthema und seine Kernpunkte.",
        timeline_system: "Du bist ein Ideenhistoriker. Antworte mit genau einem JSON-Array aus genau 6 Objekten, jedes {\"year\": \"...\", \"title\": \"...\", \"description\": \"...\"}, in chronologischer Reihenfolge. Schreibe auf Deutsch.",
        timeline_user: "Erstelle eine historische Zeitleiste mit 6 Ereignissen zu {subject}, von den Anfängen bis heute.",
        feedback_system: "Du bist ein warmherziger, inspirierender Mentor. Schreibe eine kurze Erzählung in schlichter deutscher Prosa: keine Markdown-Hervorhebung, keine nummerierten Listen, keine Aufzählungszeichen. Ermutige den Lernenden weiterzulernen.",
        feedback_user: "Thema: {subject}\nPunktzahl: {score}/100\nAbgedeckte Teilthemen: {covered}\nNoch zu erkundende Teilthemen: {missing}\nBewertungsnotizen: {assessment}\n\nDer Lernende schrieb:\n{input}\n\nSchreibe eine ermutigende Zusammenfassung des Stands und der nächsten Schritte.",
        retranslate_user: "Übersetze den folgenden Text treu ins Deutsche. Gib nur die Übersetzung zurück:\n\n{text}",
        placeholder_overview: "Überblick nicht verfügbar",
        placeholder_key_point: "Die Erklärung konnte nicht erstellt werden",
    },
    LanguagePack {
        code: "ja",
        analysis_system: "あなたは厳密な知識評価者です。あるテーマについての自由記述の回答を評価してください。次の形のJSONオブジェクトを一つだけ返してください: {shape}。カバー率は現実的でばらつきのある値にし、すべてのトピックを100にしてはいけません。名前、説明、フィードバックはすべて日本語で書いてください。",
        analysis_user: "テーマ: {subject}\n\n学習者の回答:\n{input}\n\n回答を評価してください: 素点、カバーされたトピック、欠けている重要なトピック、トピックごとのカバー率、そして2〜3文のフィードバック。",
        topic_system: "あなたは簡潔な専門チューターです。次のJSONオブジェクトを一つだけ返してください: {\"overview\": \"2〜3文\", \"key_points\": [\"3〜5個の短い要点\"]}。日本語で書いてください。",
        topic_user: "テーマ: {subject}\nトピック: {topic}\n文脈: {description}\n\nこのトピックの概要と要点を簡潔に説明してください。",
        timeline_system: "あなたは思想史の歴史家です。ちょうど6個のオブジェクトからなるJSON配列を一つだけ返してください。各要素は {\"year\": \"...\", \"title\": \"...\", \"description\": \"...\"} で、年代順に並べてください。日本語で書いてください。",
        timeline_user: "{subject} の起源から現在までをたどる6つの出来事の年表を作ってください。",
        feedback_system: "あなたは温かく励ますメンターです。日本語の平易な散文で短い文章を書いてください。マークダウンの強調、番号付きリスト、箇条書きは使わないでください。学び続けるよう励ましてください。",
        feedback_user: "テーマ: {subject}\n得点: {score}/100\nカバーされたトピック: {covered}\n次に学ぶトピック: {missing}\n評価メモ: {assessment}\n\n学習者の回答:\n{input}\n\n現在地とこれからの道のりを励ます要約を書いてください。",
        retranslate_user: "次のテキストを忠実に日本語へ翻訳してください。翻訳のみを返してください:\n\n{text}",
        placeholder_overview: "概要は利用できません",
        placeholder_key_point: "説明を生成できませんでした",
    },
];

/// Expand the `{shape}` marker in an analysis system prompt.
pub(crate) fn analysis_system_prompt(pack: &LanguagePack) -> String {
    pack.analysis_system.replace("{shape}", ANALYSIS_SHAPE)
}

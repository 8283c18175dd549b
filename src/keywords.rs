// src/keywords.rs

// Ключевых слов больше, чем ответов: ответы идут по кругу,
// слово с индексом i получает ANSWERS[i % ANSWERS.len()].
pub const KEYWORDS: [&str; 52] = [
    "привет",
    "как дела",
    "погода",
    "новости",
    "курс доллара",
    "биткоин",
    "путин",
    "что такое",
    "кто такой",
    "когда",
    "почему",
    "как работает",
    "откуда",
    "сколько стоит",
    "анекдот",
    "расскажи шутку",
    "посоветуй фильм",
    "цитата",
    "мотивируй",
    "совет",
    "рецепт",
    "игра",
    "любовь",
    "работа",
    "python",
    "java",
    "бот",
    "кот",
    "погода завтра",
    "учёба",
    "мем",
    "юмор",
    "правда",
    "интересный факт",
    "деньги",
    "счастье",
    "здоровье",
    "рейтинг",
    "top",
    "гороскоп",
    "будущее",
    "дружба",
    "страна",
    "власть",
    "психология",
    "нейросеть",
    "инструкция",
    "sql",
    "flask",
    "react",
    "vue",
    "сайт",
];

pub const ANSWERS: [&str; 48] = [
    "Привет! Я всегда рад общаться.",
    "Всё отлично, работаю для вас 24/7!",
    "Погода сегодня отличная — самое время сделать что-то новое.",
    "Вот свежие новости России: ...",
    "Курс доллара уточните на сайте банка, но могу примерно рассказать.",
    "Биткоин сейчас очень популярен среди инвесторов.",
    "Владимир Владимирович Путин — Президент РФ.",
    "Это очень интересный вопрос! Сейчас расскажу подробно.",
    "Этот термин часто используется, например...",
    "Расскажу коротко: ...",
    "Вот как это работает: ...",
    "Обычно так бывает потому что ...",
    "Рецепт дня — борщ по-домашнему.",
    "Вам стоит попробовать фильм 'Гарри Поттер' — отличный выбор!",
    "Держите цитату: 'Будущее принадлежит тем, кто верит в красоту своей мечты.'",
    "Шутка дня: Заходит нейросеть в бар, а бармен ей: 'Тебя не обслуживаем!'",
    "Мой совет — не бойтесь пробовать новое!",
    "В игре важна стратегия и удача!",
    "Любовь — великая сила, вдохновляющая людей.",
    "Работа — это путь к росту и успеху.",
    "Python — популярный язык программирования. Могу привести пример кода, если нужно!",
    "Java — строго типизированный язык. Отлично подходит для крупных проектов.",
    "Боты делают жизнь проще. Могу подсказать как их создать.",
    "Коты — лучшие антидепрессанты!",
    "Погода завтра: возможно, солнечно, как ваше настроение.",
    "Учёба — ключ к знаниям и будущему.",
    "Вот свежий мем: когда чат-бот становится твоим лучшим другом...",
    "Юмор — отличное средство от стресса.",
    "Правда — это основа доверия.",
    "Факт: мозг человека весит в среднем 1.4 кг!",
    "Деньги — инструмент, а не цель.",
    "Счастье в мелочах. Наслаждайтесь каждым моментом!",
    "Здоровье — главное богатство.",
    "Вот топ-3 интересных книги...",
    "Топ фильмов — посоветую индивидуально!",
    "Гороскоп: у вас всё получится!",
    "Будущее — за искусственным интеллектом.",
    "Дружба — опора в жизни.",
    "Каждая страна уникальна и интересна.",
    "Власть — большая ответственность.",
    "Психология — наука о душе.",
    "Нейросеть — это структура, вдохновлённая мозгом человека.",
    "Вот простая инструкция...",
    "SQL — язык для работы с базой данных.",
    "Flask — микро-фреймворк на Python.",
    "React — библиотека для фронтенда.",
    "Vue — ещё одна библиотека для UI.",
    "Сайт — твой виртуальный офис :)",
];

/// Упорядоченная таблица "ключевое слово -> заготовленный ответ".
#[derive(Clone, Copy, Debug)]
pub struct KeywordTable {
    keywords: &'static [&'static str],
    answers: &'static [&'static str],
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new(&KEYWORDS, &ANSWERS)
    }
}

impl KeywordTable {
    pub const fn new(keywords: &'static [&'static str], answers: &'static [&'static str]) -> Self {
        Self { keywords, answers }
    }

    /// Ответ для первого ключевого слова из списка, найденного в сообщении.
    pub fn answer_for(&self, message_lower: &str) -> Option<&'static str> {
        if self.answers.is_empty() {
            return None;
        }
        self.keywords
            .iter()
            .position(|keyword| message_lower.contains(keyword))
            .and_then(|index| self.answers.get(index % self.answers.len()))
            .copied()
    }
}

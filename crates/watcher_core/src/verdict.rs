/// Known review statuses and the verdict text sent for each.
const VERDICTS: [(&str, &str); 3] = [
    ("approved", "Работа проверена: ревьюеру всё понравилось. Ура!"),
    ("reviewing", "Работа взята на проверку ревьюером."),
    ("rejected", "Работа проверена: у ревьюера есть замечания."),
];

/// Look up the verdict text for a status code. `None` means the status is unknown.
pub fn verdict_for(status: &str) -> Option<&'static str> {
    VERDICTS
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, verdict)| *verdict)
}

/// All status codes with a verdict, in table order.
pub fn known_statuses() -> impl Iterator<Item = &'static str> {
    VERDICTS.iter().map(|(code, _)| *code)
}

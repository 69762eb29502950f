use chrono::{Local, Months, NaiveDate};
use pawnshop_core::model::validation::{
    validate_birth_date_on, validate_email, validate_first_name, validate_gender,
    validate_last_name, validate_passport_number, validate_passport_series, validate_patronymic,
    validate_phone_number, NameField,
};
use pawnshop_core::{Client, ClientValidationError, Gender};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn years_ago(years: u32) -> NaiveDate {
    Local::now()
        .date_naive()
        .checked_sub_months(Months::new(years * 12))
        .unwrap()
}

fn valid_client() -> Client {
    Client::new(
        "Иванов",
        "Иван",
        "1234",
        "567890",
        "+7 (999) 123-45-67",
        years_ago(30),
        Gender::Male,
    )
    .with_patronymic("Иванович")
    .with_email("ivanov@example.com")
}

#[test]
fn fully_populated_client_is_valid() {
    let client = valid_client();
    assert!(client.is_valid());
    assert_eq!(client.validate(), Ok(()));
}

#[test]
fn name_length_is_counted_in_characters() {
    assert_eq!(
        validate_last_name("Я"),
        Err(ClientValidationError::NameLength {
            field: NameField::LastName,
            length: 1
        })
    );
    assert_eq!(validate_last_name("Ян"), Ok(()));
    assert_eq!(validate_first_name(&"а".repeat(255)), Ok(()));
    assert_eq!(
        validate_first_name(&"а".repeat(256)),
        Err(ClientValidationError::NameLength {
            field: NameField::FirstName,
            length: 256
        })
    );
}

#[test]
fn names_allow_letters_hyphens_and_spaces_only() {
    assert_eq!(validate_last_name("Римский-Корсаков"), Ok(()));
    assert_eq!(validate_last_name("van der Berg"), Ok(()));
    assert_eq!(validate_last_name("Ёлкин"), Ok(()));
    assert_eq!(
        validate_last_name("Ivanov2"),
        Err(ClientValidationError::InvalidNameCharacters(
            NameField::LastName
        ))
    );
    assert_eq!(
        validate_first_name("   "),
        Err(ClientValidationError::EmptyName(NameField::FirstName))
    );
}

#[test]
fn patronymic_is_optional() {
    assert_eq!(validate_patronymic(""), Ok(()));
    assert_eq!(
        validate_patronymic("И"),
        Err(ClientValidationError::NameLength {
            field: NameField::Patronymic,
            length: 1
        })
    );

    let mut client = valid_client();
    client.patronymic = None;
    assert!(client.is_valid());
}

#[test]
fn passport_fields_require_exact_digit_counts() {
    assert_eq!(validate_passport_series("1234"), Ok(()));
    assert!(validate_passport_series("123").is_err());
    assert!(validate_passport_series("12345").is_err());
    assert!(validate_passport_series("12a4").is_err());

    assert_eq!(validate_passport_number("567890"), Ok(()));
    assert!(validate_passport_number("56789").is_err());
    assert!(validate_passport_number("5678901").is_err());
}

#[test]
fn phone_counts_digits_and_ignores_separators() {
    assert_eq!(validate_phone_number("+7 (999) 123-45-67"), Ok(()));
    assert_eq!(validate_phone_number("79991234567"), Ok(()));
    assert_eq!(
        validate_phone_number("+7 999 123 45 6"),
        Err(ClientValidationError::InvalidPhoneNumber { digits: 10 })
    );
    assert_eq!(
        validate_phone_number("799912345678"),
        Err(ClientValidationError::InvalidPhoneNumber { digits: 12 })
    );
}

#[test]
fn email_is_optional_but_checked_when_present() {
    assert_eq!(validate_email(""), Ok(()));
    assert_eq!(validate_email("user.name+tag@mail.example.ru"), Ok(()));
    assert!(matches!(
        validate_email("not-an-email"),
        Err(ClientValidationError::InvalidEmail(_))
    ));
    assert!(matches!(
        validate_email("user@"),
        Err(ClientValidationError::InvalidEmail(_))
    ));

    let long = format!("{}@example.com", "a".repeat(250));
    assert!(matches!(
        validate_email(&long),
        Err(ClientValidationError::EmailTooLong { .. })
    ));
}

#[test]
fn birth_date_boundaries() {
    let today = date(2024, 6, 15);

    assert_eq!(
        validate_birth_date_on(date(2024, 6, 16), today),
        Err(ClientValidationError::BirthDateInFuture(date(2024, 6, 16)))
    );
    assert_eq!(validate_birth_date_on(date(2010, 6, 15), today), Ok(()));
    assert_eq!(
        validate_birth_date_on(date(2010, 6, 16), today),
        Err(ClientValidationError::AgeOutOfRange { age: 13 })
    );
    assert_eq!(validate_birth_date_on(date(1874, 6, 15), today), Ok(()));
    assert_eq!(
        validate_birth_date_on(date(1874, 6, 14), today),
        Err(ClientValidationError::BirthDateTooOld(date(1874, 6, 14)))
    );
}

#[test]
fn relative_birth_dates_against_today() {
    let mut client = valid_client();

    client.birth_date = years_ago(14);
    assert!(client.is_valid());

    client.birth_date = years_ago(13);
    assert!(!client.is_valid());

    client.birth_date = years_ago(151);
    assert!(matches!(
        client.validate(),
        Err(ClientValidationError::BirthDateTooOld(_))
    ));

    client.birth_date = Local::now().date_naive().succ_opt().unwrap();
    assert!(matches!(
        client.validate(),
        Err(ClientValidationError::BirthDateInFuture(_))
    ));
}

#[test]
fn negative_identity_is_rejected() {
    let client = valid_client().with_id(-1);
    assert_eq!(client.validate(), Err(ClientValidationError::NegativeId(-1)));
}

#[test]
fn first_violation_is_reported() {
    let mut client = valid_client();
    client.last_name = "X".to_string();
    client.passport_series = "1".to_string();

    assert!(matches!(
        client.validate(),
        Err(ClientValidationError::NameLength {
            field: NameField::LastName,
            ..
        })
    ));
}

#[test]
fn gender_accepts_labels_and_codes() {
    assert_eq!(validate_gender("Male"), Ok(Gender::Male));
    assert_eq!(validate_gender("female"), Ok(Gender::Female));
    assert_eq!(validate_gender("F"), Ok(Gender::Female));
    assert_eq!(
        validate_gender("Other"),
        Err(ClientValidationError::InvalidGender("Other".to_string()))
    );
}

#[test]
fn age_and_display_helpers() {
    let client = Client::new(
        "Petrova",
        "Anna",
        "4321",
        "098765",
        "89990001122",
        date(1990, 3, 10),
        Gender::Female,
    );

    assert_eq!(client.age_on(date(2024, 3, 9)), 33);
    assert_eq!(client.age_on(date(2024, 3, 10)), 34);
    assert_eq!(client.full_name(), "Petrova Anna");
    assert_eq!(client.full_passport(), "4321 098765");
    assert_eq!(client.normalized_phone(), "89990001122");
    assert_eq!(client.to_string(), "Petrova Anna");
    assert!(client.full_info().contains("passport: 4321 098765"));

    let summary = client.summary();
    assert_eq!(summary.last_name, "Petrova");
    assert_eq!(summary.passport_number, "098765");
}
